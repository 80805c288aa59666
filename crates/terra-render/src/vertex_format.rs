//! `wgpu` vertex layout for [`TerrainVertex`].
//!
//! | Location | Offset | Format    | Field    |
//! |----------|--------|-----------|----------|
//! | 0        | 0      | Float32x3 | position |
//! | 1        | 12     | Float32x3 | normal   |
//! | 2        | 24     | Float32x4 | color    |

use std::mem;

use terra_mesh::TerrainVertex;
use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

pub const TERRAIN_VERTEX_ATTRIBUTES: [VertexAttribute; 3] = [
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 12,
        shader_location: 1,
    },
    VertexAttribute {
        format: VertexFormat::Float32x4,
        offset: 24,
        shader_location: 2,
    },
];

/// Layout shared by every terrain pipeline.
pub const TERRAIN_VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: mem::size_of::<TerrainVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &TERRAIN_VERTEX_ATTRIBUTES,
};

const _: () = assert!(
    mem::size_of::<TerrainVertex>() == 40,
    "TerrainVertex size changed; update TERRAIN_VERTEX_LAYOUT"
);
const _: () = assert!(TERRAIN_VERTEX_ATTRIBUTES[2].offset + 16 == mem::size_of::<TerrainVertex>() as u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_matches_packed_vertex() {
        assert_eq!(
            TERRAIN_VERTEX_LAYOUT.array_stride,
            terra_mesh::TERRAIN_VERTEX_STRIDE
        );
    }

    #[test]
    fn test_offsets_match_field_offsets() {
        assert_eq!(
            TERRAIN_VERTEX_ATTRIBUTES[0].offset,
            mem::offset_of!(TerrainVertex, position) as u64
        );
        assert_eq!(
            TERRAIN_VERTEX_ATTRIBUTES[1].offset,
            mem::offset_of!(TerrainVertex, normal) as u64
        );
        assert_eq!(
            TERRAIN_VERTEX_ATTRIBUTES[2].offset,
            mem::offset_of!(TerrainVertex, color) as u64
        );
    }

    #[test]
    fn test_shader_locations_are_sequential() {
        for (i, attr) in TERRAIN_VERTEX_ATTRIBUTES.iter().enumerate() {
            assert_eq!(attr.shader_location, i as u32);
        }
    }

    #[test]
    fn test_layout_is_valid_for_wgpu_pipeline() {
        let Some((device, _queue)) = crate::test_support::test_device() else {
            return;
        };

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("test_terrain_shader"),
            source: wgpu::ShaderSource::Wgsl(
                r#"
                struct VsOut {
                    @builtin(position) position: vec4<f32>,
                    @location(0) color: vec4<f32>,
                };

                @vertex
                fn vs_main(
                    @location(0) position: vec3<f32>,
                    @location(1) normal: vec3<f32>,
                    @location(2) color: vec4<f32>,
                ) -> VsOut {
                    var out: VsOut;
                    out.position = vec4<f32>(position, 1.0);
                    out.color = color * max(normal.z, 0.2);
                    return out;
                }

                @fragment
                fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
                    return in.color;
                }
                "#
                .into(),
            ),
        });

        let _pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("test_terrain_pipeline"),
            layout: None,
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[TERRAIN_VERTEX_LAYOUT],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba8UnormSrgb,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview_mask: None,
            cache: None,
        });
    }
}
