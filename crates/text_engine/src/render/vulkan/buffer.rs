//! Buffer management for vertex and instance data
//!
//! Host-visible buffers with RAII cleanup. Instance data goes through a
//! persistently mapped buffer so each flush is a plain memory copy.

use std::marker::PhantomData;
use std::mem;

use ash::{vk, Device};
use bytemuck::Pod;

use super::context::{PhysicalDeviceInfo, VulkanError, VulkanResult};

/// Buffer wrapper with memory management
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a new buffer with memory allocation
    pub fn new(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device.create_buffer(&buffer_info, None)
                .map_err(VulkanError::Api)?
        };

        let mem_requirements = unsafe {
            device.get_buffer_memory_requirements(buffer)
        };

        let memory = physical_device
            .find_memory_type(mem_requirements.memory_type_bits, properties)
            .and_then(|memory_type_index| {
                let alloc_info = vk::MemoryAllocateInfo::builder()
                    .allocation_size(mem_requirements.size)
                    .memory_type_index(memory_type_index);
                unsafe { device.allocate_memory(&alloc_info, None).map_err(VulkanError::Api) }
            });

        let memory = match memory {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        let buffer = Self {
            device,
            buffer,
            memory,
            size,
        };

        unsafe {
            buffer.device.bind_buffer_memory(buffer.buffer, buffer.memory, 0)
                .map_err(VulkanError::Api)?;
        }

        Ok(buffer)
    }

    /// Create a host-visible buffer holding `data`
    pub fn with_data<T: Pod>(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        usage: vk::BufferUsageFlags,
        data: &[T],
    ) -> VulkanResult<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let buffer = Self::new(
            device,
            physical_device,
            bytes.len() as vk::DeviceSize,
            usage,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        buffer.write_data(data)?;
        Ok(buffer)
    }

    /// Map memory for writing
    fn map_memory(&self) -> VulkanResult<*mut u8> {
        unsafe {
            self.device.map_memory(
                self.memory,
                0,
                self.size,
                vk::MemoryMapFlags::empty()
            )
            .map(|ptr| ptr.cast::<u8>())
            .map_err(VulkanError::Api)
        }
    }

    /// Unmap memory
    fn unmap_memory(&self) {
        unsafe {
            self.device.unmap_memory(self.memory);
        }
    }

    /// Write data to the start of the buffer
    pub fn write_data<T: Pod>(&self, data: &[T]) -> VulkanResult<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if bytes.len() as vk::DeviceSize > self.size {
            return Err(VulkanError::InvalidOperation {
                reason: format!("{} bytes do not fit in a {} byte buffer", bytes.len(), self.size),
            });
        }

        let data_ptr = self.map_memory()?;
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), data_ptr, bytes.len());
        }
        self.unmap_memory();
        Ok(())
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Get size
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Persistently mapped vertex buffer of per-instance records
pub struct InstanceBuffer<T: Pod> {
    buffer: Buffer,
    mapped: *mut u8,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> InstanceBuffer<T> {
    /// Allocate room for `capacity` instances and map it
    pub fn new(device: Device, physical_device: &PhysicalDeviceInfo, capacity: usize) -> VulkanResult<Self> {
        let size = (capacity.max(1) * mem::size_of::<T>()) as vk::DeviceSize;
        let buffer = Buffer::new(
            device,
            physical_device,
            size,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        let mapped = buffer.map_memory()?;

        log::debug!(
            "Instance buffer: {} slots of {} bytes",
            capacity, mem::size_of::<T>()
        );

        Ok(Self {
            buffer,
            mapped,
            capacity,
            _marker: PhantomData,
        })
    }

    /// Copy `instances` into slots starting at `first`
    pub fn write(&mut self, first: usize, instances: &[T]) -> VulkanResult<()> {
        let end = first.checked_add(instances.len()).filter(|&end| end <= self.capacity);
        if end.is_none() {
            return Err(VulkanError::InstanceBufferFull {
                requested: instances.len(),
                available: self.capacity.saturating_sub(first),
            });
        }

        let bytes: &[u8] = bytemuck::cast_slice(instances);
        unsafe {
            std::ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                self.mapped.add(first * mem::size_of::<T>()),
                bytes.len(),
            );
        }
        Ok(())
    }

    /// Number of instance slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }
}

impl<T: Pod> Drop for InstanceBuffer<T> {
    fn drop(&mut self) {
        self.buffer.unmap_memory();
    }
}
