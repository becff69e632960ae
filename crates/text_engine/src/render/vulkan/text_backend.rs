//! Vulkan implementation of [`GlyphDrawBackend`]
//!
//! Owns the context, the text pipeline and per-frame resources. A frame is
//! bracketed by [`VulkanTextBackend::begin_frame`] and
//! [`VulkanTextBackend::end_frame`]; text runs are recorded in between.
//! Each frame in flight owns a fixed region of one persistently mapped
//! instance buffer, and every flush lands in the next free slots of that
//! region, addressed through `first_instance`.

use ash::vk;

use super::buffer::{Buffer, InstanceBuffer};
use super::commands::CommandPool;
use super::config::VulkanRendererConfig;
use super::context::{VulkanContext, VulkanError, VulkanResult};
use super::descriptor_set::DescriptorSetLayout;
use super::framebuffer::Framebuffer;
use super::render_pass::RenderPass;
use super::shader::{GlyphInstance, ShaderModule, TextPipeline, TextPushConstants, QUAD_VERTICES};
use super::sync::FrameSync;
use super::texture::AtlasTexture;
use super::window::Window;
use crate::foundation::math::{screen_orthographic, vulkan_clip_correction, Mat4, Vec3};
use crate::text::{AtlasImage, GlyphDrawBackend};

/// State of the frame currently being recorded
struct ActiveFrame {
    image_index: u32,
    command_buffer: vk::CommandBuffer,
    /// Next free slot in this frame's instance region
    instance_cursor: usize,
    text_bound: bool,
}

/// Records instanced glyph draws into swapchain frames
pub struct VulkanTextBackend {
    // Field order is destruction order: everything before `context` holds
    // handles created from its device.
    frame_sync: Vec<FrameSync>,
    command_buffers: Vec<vk::CommandBuffer>,
    command_pool: CommandPool,
    instance_buffer: InstanceBuffer<GlyphInstance>,
    quad_buffer: Buffer,
    framebuffers: Vec<Framebuffer>,
    pipeline: TextPipeline,
    atlas_layout: DescriptorSetLayout,
    render_pass: RenderPass,
    context: VulkanContext,

    projection: Mat4,
    clear_color: [f32; 3],
    instances_per_frame: usize,
    staging: Vec<GlyphInstance>,
    current_frame: usize,
    active: Option<ActiveFrame>,
}

impl VulkanTextBackend {
    /// Create the backend for `window`
    pub fn new(window: &mut Window, config: VulkanRendererConfig) -> VulkanResult<Self> {
        config
            .validate()
            .map_err(|e| VulkanError::InitializationFailed(e.to_string()))?;

        let context = VulkanContext::new(
            window,
            &config.application_name,
            config.application_version,
            config.validation_enabled(),
        )?;
        let device = context.device().clone();

        let render_pass = RenderPass::new_text_pass(device.clone(), context.swapchain().format().format)?;
        let atlas_layout = DescriptorSetLayout::glyph_atlas(&device)?;

        log::info!(
            "Loading text shaders: {} / {}",
            config.shaders.vertex_shader_path, config.shaders.fragment_shader_path
        );
        let vertex_shader = ShaderModule::from_file(device.clone(), &config.shaders.vertex_shader_path)?;
        let fragment_shader = ShaderModule::from_file(device.clone(), &config.shaders.fragment_shader_path)?;
        let pipeline = TextPipeline::new(
            device.clone(),
            render_pass.handle(),
            &vertex_shader,
            &fragment_shader,
            &atlas_layout,
        )?;

        let framebuffers = Framebuffer::for_swapchain(&device, render_pass.handle(), context.swapchain())?;

        let quad_buffer = Buffer::with_data(
            device.clone(),
            context.physical_device(),
            vk::BufferUsageFlags::VERTEX_BUFFER,
            &QUAD_VERTICES,
        )?;

        let frames = config.max_frames_in_flight;
        let instances_per_frame = config.max_instances_per_frame;
        let instance_buffer = InstanceBuffer::new(
            device.clone(),
            context.physical_device(),
            instances_per_frame * frames,
        )?;

        let command_pool = CommandPool::new(device.clone(), context.graphics_queue_family())?;
        let frame_count = u32::try_from(frames)
            .map_err(|_| VulkanError::InitializationFailed(format!("{} frames in flight", frames)))?;
        let command_buffers = command_pool.allocate_command_buffers(frame_count)?;
        let frame_sync = (0..frames)
            .map(|_| FrameSync::new(&device))
            .collect::<VulkanResult<Vec<_>>>()?;

        let (width, height) = config.surface_size;
        let projection = vulkan_clip_correction() * screen_orthographic(width as f32, height as f32);

        log::info!(
            "Text backend ready: {} frames in flight, {} instances per frame",
            frames, instances_per_frame
        );

        Ok(Self {
            frame_sync,
            command_buffers,
            command_pool,
            instance_buffer,
            quad_buffer,
            framebuffers,
            pipeline,
            atlas_layout,
            render_pass,
            context,
            projection,
            clear_color: config.clear_color,
            instances_per_frame,
            staging: Vec::new(),
            current_frame: 0,
            active: None,
        })
    }

    /// Upload a built atlas image as a texture this backend can bind
    pub fn upload_atlas(&self, image: &AtlasImage) -> VulkanResult<AtlasTexture> {
        AtlasTexture::upload(&self.context, &self.command_pool, &self.atlas_layout, image)
    }

    /// Projection applied to every glyph
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Acquire a swapchain image and start recording
    ///
    /// Returns `Ok(false)` when no frame can be drawn right now (minimized
    /// window or a swapchain that had to be recreated); skip drawing and try
    /// again next iteration.
    pub fn begin_frame(&mut self, window: &mut Window) -> VulkanResult<bool> {
        if self.active.is_some() {
            return Err(VulkanError::InvalidOperation {
                reason: "begin_frame called twice without end_frame".to_string(),
            });
        }
        if window.is_minimized() {
            return Ok(false);
        }

        let sync = &self.frame_sync[self.current_frame];
        sync.in_flight.wait(u64::MAX)?;

        let acquired = unsafe {
            self.context.swapchain().loader().acquire_next_image(
                self.context.swapchain().handle(),
                u64::MAX,
                sync.image_available.handle(),
                vk::Fence::null(),
            )
        };

        let image_index = match acquired {
            Ok((index, _suboptimal)) => index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                self.recreate_swapchain(window)?;
                return Ok(false);
            }
            Err(e) => return Err(VulkanError::Api(e)),
        };

        sync.in_flight.reset()?;

        let command_buffer = self.command_buffers[self.current_frame];
        let device = self.context.device();
        let extent = self.context.swapchain().extent();
        let framebuffer = self
            .framebuffers
            .get(image_index as usize)
            .ok_or_else(|| VulkanError::InvalidOperation {
                reason: format!("No framebuffer for swapchain image {}", image_index),
            })?;

        let [r, g, b] = self.clear_color;
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue { float32: [r, g, b, 1.0] },
        }];

        let begin_info = vk::CommandBufferBeginInfo::builder()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        let render_pass_begin = vk::RenderPassBeginInfo::builder()
            .render_pass(self.render_pass.handle())
            .framebuffer(framebuffer.handle())
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);

        unsafe {
            device.reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(VulkanError::Api)?;
            device.begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::Api)?;
            device.cmd_begin_render_pass(command_buffer, &render_pass_begin, vk::SubpassContents::INLINE);
        }

        self.active = Some(ActiveFrame {
            image_index,
            command_buffer,
            instance_cursor: 0,
            text_bound: false,
        });
        Ok(true)
    }

    /// Finish recording, submit and present the frame
    pub fn end_frame(&mut self, window: &mut Window) -> VulkanResult<()> {
        let frame = self.active.take().ok_or_else(|| VulkanError::InvalidOperation {
            reason: "end_frame called without begin_frame".to_string(),
        })?;

        let device = self.context.device();
        let sync = &self.frame_sync[self.current_frame];

        unsafe {
            device.cmd_end_render_pass(frame.command_buffer);
            device.end_command_buffer(frame.command_buffer)
                .map_err(VulkanError::Api)?;
        }

        let wait_semaphores = [sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [frame.command_buffer];
        let signal_semaphores = [sync.render_finished.handle()];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            device.queue_submit(self.context.graphics_queue(), &[submit_info.build()], sync.in_flight.handle())
                .map_err(VulkanError::Api)?;
        }

        let swapchains = [self.context.swapchain().handle()];
        let image_indices = [frame.image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let presented = unsafe {
            self.context.swapchain().loader().queue_present(self.context.present_queue(), &present_info)
        };

        self.current_frame = (self.current_frame + 1) % self.frame_sync.len();

        let needs_recreate = match presented {
            Ok(suboptimal) => suboptimal,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => true,
            Err(e) => return Err(VulkanError::Api(e)),
        };

        if needs_recreate | window.take_resized() {
            self.recreate_swapchain(window)?;
        }
        Ok(())
    }

    fn recreate_swapchain(&mut self, window: &Window) -> VulkanResult<()> {
        if window.is_minimized() {
            return Ok(());
        }

        self.framebuffers.clear();
        self.context.recreate_swapchain(window)?;
        self.framebuffers = Framebuffer::for_swapchain(
            self.context.device(),
            self.render_pass.handle(),
            self.context.swapchain(),
        )?;
        Ok(())
    }

    fn active_frame(&mut self) -> VulkanResult<&mut ActiveFrame> {
        self.active.as_mut().ok_or_else(|| VulkanError::InvalidOperation {
            reason: "text drawn outside begin_frame/end_frame".to_string(),
        })
    }
}

impl GlyphDrawBackend for VulkanTextBackend {
    type Atlas = AtlasTexture;
    type Error = VulkanError;

    fn begin_text(&mut self, atlas: &AtlasTexture, color: Vec3) -> VulkanResult<()> {
        let push_constants = TextPushConstants::new(&self.projection, color);
        let extent = self.context.swapchain().extent();
        let pipeline = self.pipeline.handle();
        let pipeline_layout = self.pipeline.layout();
        let quad_buffer = self.quad_buffer.handle();
        let instance_buffer = self.instance_buffer.handle();

        let frame = self.active_frame()?;
        let command_buffer = frame.command_buffer;
        frame.text_bound = true;

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        let device = self.context.device();
        unsafe {
            device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline);
            device.cmd_set_viewport(command_buffer, 0, &[viewport]);
            device.cmd_set_scissor(command_buffer, 0, &[scissor]);
            device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline_layout,
                0,
                &[atlas.descriptor_set()],
                &[],
            );
            device.cmd_push_constants(
                command_buffer,
                pipeline_layout,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                0,
                bytemuck::bytes_of(&push_constants),
            );
            device.cmd_bind_vertex_buffers(command_buffer, 0, &[quad_buffer, instance_buffer], &[0, 0]);
        }
        Ok(())
    }

    fn draw_glyph_instances(&mut self, transforms: &[Mat4], layers: &[u32]) -> VulkanResult<()> {
        let region_start = self.current_frame * self.instances_per_frame;
        let region_len = self.instances_per_frame;

        let frame = self.active_frame()?;
        if !frame.text_bound {
            return Err(VulkanError::InvalidOperation {
                reason: "draw_glyph_instances called before begin_text".to_string(),
            });
        }
        let cursor = frame.instance_cursor;
        let command_buffer = frame.command_buffer;

        let count = transforms.len().min(layers.len());
        let available = region_len - cursor;
        if count > available {
            return Err(VulkanError::InstanceBufferFull { requested: count, available });
        }

        self.staging.clear();
        self.staging.extend(
            transforms
                .iter()
                .zip(layers)
                .map(|(transform, &layer)| GlyphInstance::new(transform, layer)),
        );
        self.instance_buffer.write(region_start + cursor, &self.staging)?;

        let first_instance = u32::try_from(region_start + cursor).map_err(|_| VulkanError::InvalidOperation {
            reason: "instance index exceeds u32".to_string(),
        })?;
        let instance_count = u32::try_from(count).map_err(|_| VulkanError::InvalidOperation {
            reason: "instance count exceeds u32".to_string(),
        })?;

        unsafe {
            self.context.device().cmd_draw(
                command_buffer,
                QUAD_VERTICES.len() as u32,
                instance_count,
                0,
                first_instance,
            );
        }

        if let Some(frame) = self.active.as_mut() {
            frame.instance_cursor += count;
        }
        log::trace!("Drew {} glyph instances from slot {}", count, first_instance);
        Ok(())
    }

    fn end_text(&mut self) -> VulkanResult<()> {
        self.active_frame()?.text_bound = false;
        Ok(())
    }
}

impl Drop for VulkanTextBackend {
    fn drop(&mut self) {
        let _ = self.context.wait_idle();
        log::debug!("Text backend released");
    }
}
