//! Glyph atlas texture
//!
//! Uploads the CPU atlas image into a single-channel 2D array image, one
//! array layer per character code, sampled with clamp-to-edge and linear
//! filtering.

use ash::{vk, Device};

use super::buffer::Buffer;
use super::commands::CommandPool;
use super::context::{VulkanContext, VulkanError, VulkanResult};
use super::descriptor_set::{DescriptorPool, DescriptorSetLayout};
use crate::text::AtlasImage;

/// GPU copy of the glyph atlas plus the descriptor set that binds it
pub struct AtlasTexture {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    image_view: vk::ImageView,
    sampler: vk::Sampler,
    descriptor_set: vk::DescriptorSet,
    descriptor_pool: DescriptorPool,
    layer_count: u32,
}

impl AtlasTexture {
    /// Upload `atlas` and allocate its descriptor set from `layout`
    pub fn upload(
        context: &VulkanContext,
        command_pool: &CommandPool,
        layout: &DescriptorSetLayout,
        atlas: &AtlasImage,
    ) -> VulkanResult<Self> {
        let device = context.device().clone();
        let size = atlas.layer_size();
        let layer_count = atlas.layer_count();

        let staging = Buffer::with_data(
            device.clone(),
            context.physical_device(),
            vk::BufferUsageFlags::TRANSFER_SRC,
            atlas.pixels(),
        )?;

        let image_create_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: size,
                height: size,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(layer_count)
            .format(vk::Format::R8_UNORM)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe {
            device.create_image(&image_create_info, None)
                .map_err(VulkanError::Api)?
        };

        // From here on partial state is released by Drop
        let mut texture = Self {
            device: device.clone(),
            image,
            memory: vk::DeviceMemory::null(),
            image_view: vk::ImageView::null(),
            sampler: vk::Sampler::null(),
            descriptor_set: vk::DescriptorSet::null(),
            descriptor_pool: DescriptorPool::new(device.clone(), 1)?,
            layer_count,
        };

        let memory_requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory_type_index = context.physical_device().find_memory_type(
            memory_requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        let memory_allocate_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(memory_requirements.size)
            .memory_type_index(memory_type_index);

        texture.memory = unsafe {
            device.allocate_memory(&memory_allocate_info, None)
                .map_err(VulkanError::Api)?
        };

        unsafe {
            device.bind_image_memory(image, texture.memory, 0)
                .map_err(VulkanError::Api)?;
        }

        let subresource_range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count,
        };

        command_pool.submit_one_time(context.graphics_queue(), |device, command_buffer| {
            let to_transfer = vk::ImageMemoryBarrier::builder()
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(subresource_range)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .build();

            // Layers are tightly packed, so one region covers all of them
            let region = vk::BufferImageCopy::builder()
                .buffer_offset(0)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count,
                })
                .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                .image_extent(vk::Extent3D {
                    width: size,
                    height: size,
                    depth: 1,
                })
                .build();

            let to_shader_read = vk::ImageMemoryBarrier::builder()
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(subresource_range)
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ)
                .build();

            unsafe {
                device.cmd_pipeline_barrier(
                    command_buffer,
                    vk::PipelineStageFlags::TOP_OF_PIPE,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::DependencyFlags::empty(),
                    &[],
                    &[],
                    &[to_transfer],
                );
                device.cmd_copy_buffer_to_image(
                    command_buffer,
                    staging.handle(),
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                );
                device.cmd_pipeline_barrier(
                    command_buffer,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::PipelineStageFlags::FRAGMENT_SHADER,
                    vk::DependencyFlags::empty(),
                    &[],
                    &[],
                    &[to_shader_read],
                );
            }
        })?;

        let image_view_create_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D_ARRAY)
            .format(vk::Format::R8_UNORM)
            .subresource_range(subresource_range);

        texture.image_view = unsafe {
            device.create_image_view(&image_view_create_info, None)
                .map_err(VulkanError::Api)?
        };

        let sampler_create_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR);

        texture.sampler = unsafe {
            device.create_sampler(&sampler_create_info, None)
                .map_err(VulkanError::Api)?
        };

        texture.descriptor_set = texture.descriptor_pool.allocate(layout)?;
        texture.descriptor_pool.write_image_sampler(
            texture.descriptor_set,
            0,
            texture.image_view,
            texture.sampler,
        );

        log::info!(
            "Uploaded glyph atlas: {} layers of {}x{} ({} KiB)",
            layer_count, size, size, atlas.pixels().len() / 1024
        );

        Ok(texture)
    }

    /// Descriptor set binding this atlas at binding 0
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptor_set
    }

    /// Number of array layers
    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }
}

impl Drop for AtlasTexture {
    fn drop(&mut self) {
        unsafe {
            // The atlas may still be referenced by frames in flight
            let _ = self.device.device_wait_idle();
            self.device.destroy_sampler(self.sampler, None);
            self.device.destroy_image_view(self.image_view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}
