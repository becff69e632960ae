//! Shader loading and the text graphics pipeline
//!
//! SPIR-V shader modules and the instanced glyph pipeline, following RAII
//! patterns. Vertex layout: binding 0 carries the unit quad, binding 1 one
//! [`GlyphInstance`] per glyph.

use std::ffi::CStr;
use std::mem;
use std::path::Path;

use ash::{vk, Device};
use bytemuck::{Pod, Zeroable};

use super::context::{VulkanError, VulkanResult};
use super::descriptor_set::DescriptorSetLayout;
use crate::foundation::math::{Mat4, Vec3};

/// Unit quad corners, drawn as a 4-vertex triangle strip
pub const QUAD_VERTICES: [[f32; 2]; 4] = [
    [0.0, 1.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [1.0, 0.0],
];

/// Per-instance vertex data: column-major model matrix and atlas layer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlyphInstance {
    /// Model matrix columns
    pub transform: [[f32; 4]; 4],
    /// Atlas layer index
    pub layer: u32,
}

impl GlyphInstance {
    /// Pack a transform and layer for upload
    pub fn new(transform: &Mat4, layer: u32) -> Self {
        Self {
            transform: (*transform).into(),
            layer,
        }
    }
}

/// Push constants shared by both text shader stages
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TextPushConstants {
    /// Screen-to-clip projection
    pub projection: [[f32; 4]; 4],
    /// RGB text color, alpha unused
    pub text_color: [f32; 4],
}

impl TextPushConstants {
    /// Pack a projection and color
    pub fn new(projection: &Mat4, color: Vec3) -> Self {
        Self {
            projection: (*projection).into(),
            text_color: [color.x, color.y, color.z, 1.0],
        }
    }
}

/// Shader module wrapper with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create shader module from SPIR-V bytecode
    pub fn from_bytes(device: Device, bytes: &[u8]) -> VulkanResult<Self> {
        let code = ash::util::read_spv(&mut std::io::Cursor::new(bytes))
            .map_err(|e| VulkanError::InitializationFailed(format!("Invalid SPIR-V: {}", e)))?;

        let create_info = vk::ShaderModuleCreateInfo::builder()
            .code(&code);

        let module = unsafe {
            device.create_shader_module(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, module })
    }

    /// Load shader from SPIR-V file
    pub fn from_file<P: AsRef<Path>>(device: Device, path: P) -> VulkanResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| VulkanError::InitializationFailed(format!("Failed to read shader file {}: {}", path.display(), e)))?;

        log::debug!("Loaded shader {}", path.display());
        Self::from_bytes(device, &bytes)
    }

    /// Create shader stage create info
    pub fn create_stage_info(&self, stage: vk::ShaderStageFlags, entry_point: &CStr) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(stage)
            .module(self.module)
            .name(entry_point)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Instanced glyph pipeline with RAII cleanup
pub struct TextPipeline {
    device: Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl TextPipeline {
    /// Create the pipeline for `render_pass`
    ///
    /// Viewport and scissor are dynamic, so the pipeline survives swapchain
    /// recreation.
    pub fn new(
        device: Device,
        render_pass: vk::RenderPass,
        vertex_shader: &ShaderModule,
        fragment_shader: &ShaderModule,
        atlas_layout: &DescriptorSetLayout,
    ) -> VulkanResult<Self> {
        let entry = CStr::from_bytes_with_nul(b"main\0")
            .map_err(|e| VulkanError::InitializationFailed(e.to_string()))?;

        let shader_stages = [
            vertex_shader.create_stage_info(vk::ShaderStageFlags::VERTEX, entry),
            fragment_shader.create_stage_info(vk::ShaderStageFlags::FRAGMENT, entry),
        ];

        let binding_descriptions = Self::binding_descriptions();
        let attribute_descriptions = Self::attribute_descriptions();
        let vertex_input_info = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&binding_descriptions)
            .vertex_attribute_descriptions(&attribute_descriptions);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_STRIP)
            .primitive_restart_enable(false);

        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::builder()
            .dynamic_states(&dynamic_states);

        // The clip-space Y flip reverses winding, so faces are not culled
        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(true)
            .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .alpha_blend_op(vk::BlendOp::ADD)
            .build();

        let color_blend_attachments = [color_blend_attachment];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let push_constant_ranges = [vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            offset: 0,
            size: mem::size_of::<TextPushConstants>() as u32,
        }];

        let set_layouts = [atlas_layout.handle()];
        let layout_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);
        let layout = unsafe {
            device.create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_info)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = unsafe {
            device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                &[pipeline_info.build()],
                None
            )
        };

        let pipeline = match pipelines {
            Ok(pipelines) => pipelines.first().copied(),
            Err((_, err)) => {
                unsafe { device.destroy_pipeline_layout(layout, None) };
                return Err(VulkanError::Api(err));
            }
        };
        let Some(pipeline) = pipeline else {
            unsafe { device.destroy_pipeline_layout(layout, None) };
            return Err(VulkanError::InitializationFailed("No pipeline created".to_string()));
        };

        log::debug!("Text pipeline created");

        Ok(Self {
            device,
            pipeline,
            layout,
        })
    }

    fn binding_descriptions() -> [vk::VertexInputBindingDescription; 2] {
        [
            vk::VertexInputBindingDescription {
                binding: 0,
                stride: mem::size_of::<[f32; 2]>() as u32,
                input_rate: vk::VertexInputRate::VERTEX,
            },
            vk::VertexInputBindingDescription {
                binding: 1,
                stride: mem::size_of::<GlyphInstance>() as u32,
                input_rate: vk::VertexInputRate::INSTANCE,
            },
        ]
    }

    fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 6] {
        let column = |location: u32| vk::VertexInputAttributeDescription {
            location,
            binding: 1,
            format: vk::Format::R32G32B32A32_SFLOAT,
            offset: (location - 1) * mem::size_of::<[f32; 4]>() as u32,
        };

        [
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 0,
            },
            column(1),
            column(2),
            column(3),
            column(4),
            vk::VertexInputAttributeDescription {
                location: 5,
                binding: 1,
                format: vk::Format::R32_UINT,
                offset: mem::size_of::<[[f32; 4]; 4]>() as u32,
            },
        ]
    }

    /// Get pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Get layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for TextPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_layout() {
        assert_eq!(mem::size_of::<GlyphInstance>(), 68);
        assert_eq!(mem::size_of::<TextPushConstants>(), 80);

        let attributes = TextPipeline::attribute_descriptions();
        assert_eq!(attributes[4].offset, 48);
        assert_eq!(attributes[5].offset, 64);
    }

    #[test]
    fn test_instance_packs_columns() {
        let transform = Mat4::new_translation(&Vec3::new(3.0, 4.0, 0.0));
        let instance = GlyphInstance::new(&transform, 65);
        assert_eq!(instance.transform[3], [3.0, 4.0, 0.0, 1.0]);
        assert_eq!(instance.layer, 65);
    }

    #[test]
    fn test_push_constants_color() {
        let push = TextPushConstants::new(&Mat4::identity(), Vec3::new(0.5, 0.8, 0.2));
        assert_eq!(push.text_color, [0.5, 0.8, 0.2, 1.0]);
    }
}
