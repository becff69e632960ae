//! Vulkan context management
//!
//! Instance, surface, device selection and the swapchain, each wrapped with
//! RAII cleanup. Field order in [`VulkanContext`] is the destruction order.

use ash::{Device, Entry, Instance};
#[cfg(debug_assertions)]
use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::vk;
use std::ffi::{CStr, CString};
use thiserror::Error;

use super::swapchain::Swapchain;
use super::window::Window;

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No suitable memory type found for allocation
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,

    /// A flush needed more instance slots than the frame has left
    #[error("Instance buffer full: {requested} instances requested, {available} available this frame")]
    InstanceBufferFull {
        /// Instances in the rejected draw
        requested: usize,
        /// Slots left in the current frame's region
        available: usize,
    },
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

fn c_string(value: &str) -> VulkanResult<CString> {
    CString::new(value)
        .map_err(|e| VulkanError::InitializationFailed(format!("Invalid name {:?}: {}", value, e)))
}

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    /// Debug utilities extension (debug builds)
    #[cfg(debug_assertions)]
    pub debug_utils: Option<DebugUtils>,
    /// Debug messenger handle (debug builds)
    #[cfg(debug_assertions)]
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanInstance {
    /// Create a new Vulkan instance, with validation layers when requested
    pub fn new(
        window: &Window,
        app_name: &str,
        app_version: (u32, u32, u32),
        enable_validation: bool,
    ) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::InitializationFailed(format!("Failed to load Vulkan: {:?}", e)))?;

        let app_name_cstr = c_string(app_name)?;
        let engine_name_cstr = c_string("TextEngine")?;
        let (major, minor, patch) = app_version;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, major, minor, patch))
            .engine_name(&engine_name_cstr)
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_0);

        let required_extensions = window.get_required_instance_extensions()
            .map_err(|e| VulkanError::InitializationFailed(format!("Failed to get required extensions: {}", e)))?;

        let cstr_extensions = required_extensions
            .iter()
            .map(|ext| c_string(ext))
            .collect::<VulkanResult<Vec<_>>>()?;

        #[allow(unused_mut)]
        let mut extensions: Vec<*const i8> = cstr_extensions
            .iter()
            .map(|ext| ext.as_ptr())
            .collect();

        #[cfg(debug_assertions)]
        if enable_validation {
            extensions.push(DebugUtils::name().as_ptr());
        }

        let layer_names = if cfg!(debug_assertions) && enable_validation {
            vec![c_string("VK_LAYER_KHRONOS_validation")?]
        } else {
            vec![]
        };

        let layer_names_ptrs: Vec<*const i8> = layer_names.iter()
            .map(|name| name.as_ptr())
            .collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_names_ptrs);

        let instance = unsafe {
            entry.create_instance(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        #[cfg(debug_assertions)]
        let (debug_utils, debug_messenger) = if enable_validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            let debug_messenger = Self::setup_debug_messenger(&debug_utils)?;
            (Some(debug_utils), Some(debug_messenger))
        } else {
            (None, None)
        };

        Ok(Self {
            entry,
            instance,
            #[cfg(debug_assertions)]
            debug_utils,
            #[cfg(debug_assertions)]
            debug_messenger,
        })
    }

    #[cfg(debug_assertions)]
    fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            debug_utils.create_debug_utils_messenger(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            #[cfg(debug_assertions)]
            if let (Some(debug_utils), Some(debug_messenger)) =
                (&self.debug_utils, &self.debug_messenger) {
                debug_utils.destroy_debug_utils_messenger(*debug_messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

/// Routes validation messages into the `log` facade
#[cfg(debug_assertions)]
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {:?} - {}", message_type, message);
    } else {
        log::debug!("[Vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}

/// Window surface with RAII cleanup
pub struct VulkanSurface {
    /// Surface extension loader
    pub loader: Surface,
    /// Surface handle
    pub handle: vk::SurfaceKHR,
}

impl VulkanSurface {
    /// Create the surface for `window` through GLFW
    pub fn new(instance: &VulkanInstance, window: &mut Window) -> VulkanResult<Self> {
        let loader = Surface::new(&instance.entry, &instance.instance);
        let handle = window.create_vulkan_surface(instance.instance.handle())
            .map_err(|e| VulkanError::InitializationFailed(format!("Surface creation: {}", e)))?;
        Ok(Self { loader, handle })
    }
}

impl Drop for VulkanSurface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.handle, None);
        }
    }
}

/// Physical device selection and capabilities
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Memory heaps and types
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Index of the graphics queue family
    pub graphics_family: u32,
    /// Index of the presentation queue family
    pub present_family: u32,
}

impl PhysicalDeviceInfo {
    /// Select the first GPU with graphics, present and swapchain support
    pub fn select_suitable_device(instance: &Instance, surface: &VulkanSurface) -> VulkanResult<Self> {
        let devices = unsafe {
            instance.enumerate_physical_devices()
                .map_err(VulkanError::Api)?
        };

        for device in devices {
            match Self::evaluate_device(instance, device, surface) {
                Ok(device_info) => {
                    log::info!("Selected GPU: {}", unsafe {
                        CStr::from_ptr(device_info.properties.device_name.as_ptr()).to_string_lossy()
                    });
                    return Ok(device_info);
                }
                Err(e) => log::debug!("Skipping GPU: {}", e),
            }
        }

        Err(VulkanError::InitializationFailed(
            "No suitable GPU found".to_string()
        ))
    }

    fn evaluate_device(
        instance: &Instance,
        device: vk::PhysicalDevice,
        surface: &VulkanSurface,
    ) -> VulkanResult<Self> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };
        let queue_families = unsafe {
            instance.get_physical_device_queue_family_properties(device)
        };

        let mut graphics_family = None;
        let mut present_family = None;

        for (index, family) in (0u32..).zip(queue_families.iter()) {
            if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && graphics_family.is_none() {
                graphics_family = Some(index);
            }

            let present_support = unsafe {
                surface.loader.get_physical_device_surface_support(device, index, surface.handle)
                    .map_err(VulkanError::Api)?
            };

            if present_support && present_family.is_none() {
                present_family = Some(index);
            }

            if graphics_family.is_some() && present_family.is_some() {
                break;
            }
        }

        let graphics_family = graphics_family.ok_or_else(|| {
            VulkanError::InitializationFailed("No graphics queue family found".to_string())
        })?;

        let present_family = present_family.ok_or_else(|| {
            VulkanError::InitializationFailed("No present queue family found".to_string())
        })?;

        let extensions = unsafe {
            instance.enumerate_device_extension_properties(device)
                .map_err(VulkanError::Api)?
        };

        let has_swapchain = extensions.iter().any(|available| {
            let extension_name = unsafe {
                CStr::from_ptr(available.extension_name.as_ptr())
            };
            extension_name == SwapchainLoader::name()
        });

        if !has_swapchain {
            return Err(VulkanError::InitializationFailed(
                "Swapchain extension not supported".to_string()
            ));
        }

        Ok(Self {
            device,
            properties,
            memory_properties,
            graphics_family,
            present_family,
        })
    }

    /// Find a memory type allowed by `type_filter` that has all of `properties`
    pub fn find_memory_type(
        &self,
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<u32> {
        (0..self.memory_properties.memory_type_count)
            .find(|&i| {
                (type_filter & (1 << i)) != 0
                    && self.memory_properties.memory_types[i as usize]
                        .property_flags
                        .contains(properties)
            })
            .ok_or(VulkanError::NoSuitableMemoryType)
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Surface presentation queue
    pub present_queue: vk::Queue,
}

impl LogicalDevice {
    /// Create a new logical device with graphics and present queues
    pub fn new(
        instance: &Instance,
        physical_device_info: &PhysicalDeviceInfo,
    ) -> VulkanResult<Self> {
        let mut families = vec![physical_device_info.graphics_family];
        if physical_device_info.present_family != physical_device_info.graphics_family {
            families.push(physical_device_info.present_family);
        }

        let priorities = [1.0];
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let required_extensions = [SwapchainLoader::name().as_ptr()];
        let device_features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions)
            .enabled_features(&device_features);

        let device = unsafe {
            instance.create_device(physical_device_info.device, &create_info, None)
                .map_err(VulkanError::Api)?
        };

        let graphics_queue = unsafe {
            device.get_device_queue(physical_device_info.graphics_family, 0)
        };

        let present_queue = unsafe {
            device.get_device_queue(physical_device_info.present_family, 0)
        };

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

/// Owns the core Vulkan objects for one window
pub struct VulkanContext {
    swapchain: Swapchain,
    device: LogicalDevice,
    surface: VulkanSurface,
    physical_device: PhysicalDeviceInfo,
    instance: VulkanInstance,
}

impl VulkanContext {
    /// Create a new Vulkan context for the window
    pub fn new(
        window: &mut Window,
        app_name: &str,
        app_version: (u32, u32, u32),
        enable_validation: bool,
    ) -> VulkanResult<Self> {
        let instance = VulkanInstance::new(window, app_name, app_version, enable_validation)?;
        let surface = VulkanSurface::new(&instance, window)?;
        let physical_device = PhysicalDeviceInfo::select_suitable_device(&instance.instance, &surface)?;
        let device = LogicalDevice::new(&instance.instance, &physical_device)?;

        let swapchain = Swapchain::create(
            &instance.instance,
            device.device.clone(),
            &surface,
            &physical_device,
            window.framebuffer_extent(),
            vk::SwapchainKHR::null(),
        )?;

        log::info!(
            "Vulkan context ready: {}x{} swapchain, {} images",
            swapchain.extent().width, swapchain.extent().height, swapchain.image_count()
        );

        Ok(Self {
            swapchain,
            device,
            surface,
            physical_device,
            instance,
        })
    }

    /// Get the raw Device handle
    pub fn device(&self) -> &Device {
        &self.device.device
    }

    /// Get the Vulkan instance
    pub fn instance(&self) -> &Instance {
        &self.instance.instance
    }

    /// Get the physical device info
    pub fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// Get the swapchain
    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// Get the graphics queue
    pub fn graphics_queue(&self) -> vk::Queue {
        self.device.graphics_queue
    }

    /// Get the present queue
    pub fn present_queue(&self) -> vk::Queue {
        self.device.present_queue
    }

    /// Get the graphics queue family index
    pub fn graphics_queue_family(&self) -> u32 {
        self.physical_device.graphics_family
    }

    /// Block until the device has finished all submitted work
    pub fn wait_idle(&self) -> VulkanResult<()> {
        unsafe { self.device.device.device_wait_idle().map_err(VulkanError::Api) }
    }

    /// Recreate the swapchain for the window's current framebuffer size
    pub fn recreate_swapchain(&mut self, window: &Window) -> VulkanResult<()> {
        self.wait_idle()?;

        let new_swapchain = Swapchain::create(
            &self.instance.instance,
            self.device.device.clone(),
            &self.surface,
            &self.physical_device,
            window.framebuffer_extent(),
            self.swapchain.handle(),
        )?;

        // old swapchain is retired by the create call and destroyed on drop here
        self.swapchain = new_swapchain;

        log::debug!(
            "Swapchain recreated at {}x{}",
            self.swapchain.extent().width, self.swapchain.extent().height
        );
        Ok(())
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        let _ = self.wait_idle();
    }
}
