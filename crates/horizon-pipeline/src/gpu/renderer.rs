use std::collections::HashMap;
use std::num::NonZeroU64;

use anyhow::{anyhow, Context, Result};
use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

use crate::frame::{CameraUniform, Frame, Pass, PassId, PassOutput};
use crate::lifecycle::{FrameResources, PassExecutor};
use crate::material::{BlendMode, MaterialBinding, MaterialId, TextureSource};
use crate::scene::{GeometryId, Mesh, MeshVertex, SceneAssembly, StarInstance, DISC_GRADIENT_TEXELS};
use crate::targets::{RenderTargetRegistry, WrapMode};

use super::allocator::GpuTargetAllocator;

type Targets = RenderTargetRegistry<GpuTargetAllocator>;

/// Vertices per star sprite (two triangles, expanded in the vertex shader).
const SPRITE_VERTICES: u32 = 6;

fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    let component = |src, dst, op| wgpu::BlendComponent {
        src_factor: src,
        dst_factor: dst,
        operation: op,
    };
    use wgpu::{BlendFactor as F, BlendOperation as Op};
    match mode {
        BlendMode::Opaque => None,
        BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        BlendMode::Additive => Some(wgpu::BlendState {
            color: component(F::SrcAlpha, F::One, Op::Add),
            alpha: component(F::One, F::One, Op::Add),
        }),
        BlendMode::Max => Some(wgpu::BlendState {
            color: component(F::One, F::One, Op::Max),
            alpha: component(F::One, F::One, Op::Max),
        }),
    }
}

fn material_label(id: MaterialId) -> &'static str {
    match id {
        MaterialId::Noise => "horizon noise",
        MaterialId::Stars => "horizon stars",
        MaterialId::Disc => "horizon disc",
        MaterialId::Hole => "horizon distortion hole",
        MaterialId::LensDisc => "horizon distortion disc",
        MaterialId::Composition => "horizon composition",
        MaterialId::Dither => "horizon dither",
    }
}

fn pass_label(id: PassId) -> &'static str {
    match id {
        PassId::NoiseBake => "horizon noise bake pass",
        PassId::World => "horizon world pass",
        PassId::Distortion => "horizon distortion pass",
        PassId::Composition => "horizon composition pass",
        PassId::Dither => "horizon dither pass",
    }
}

// ── scene resources ───────────────────────────────────────────────────────

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &Mesh) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
        }
    }
}

struct MaterialGpu {
    layout: wgpu::BindGroupLayout,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    uniforms: wgpu::Buffer,
    /// Bind group plus the target generations it was built against.
    bind_group: Option<(Vec<u64>, wgpu::BindGroup)>,
}

struct SceneResources {
    meshes: HashMap<GeometryId, GpuMesh>,
    stars: wgpu::Buffer,
    star_count: u32,
    _gradient: wgpu::Texture,
    gradient_view: wgpu::TextureView,
    materials: HashMap<MaterialId, MaterialGpu>,
}

// ── renderer ──────────────────────────────────────────────────────────────

/// GPU state of the pipeline.
///
/// Scene resources are created on the first frame and kept for the run;
/// pipelines are created per (material, output format) on first use.
pub struct GpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,

    camera_layout: wgpu::BindGroupLayout,
    rig_camera: (wgpu::Buffer, wgpu::BindGroup),
    screen_camera: (wgpu::Buffer, wgpu::BindGroup),
    clamp_sampler: wgpu::Sampler,
    repeat_sampler: wgpu::Sampler,

    scene: Option<SceneResources>,
    pipelines: HashMap<(MaterialId, wgpu::TextureFormat), wgpu::RenderPipeline>,
}

impl GpuRenderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, surface_format: wgpu::TextureFormat) -> Self {
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("horizon camera bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<CameraUniform>() as u64),
                },
                count: None,
            }],
        });

        let camera = |label| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&CameraUniform::zeroed()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &camera_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            (buffer, bind_group)
        };
        let rig_camera = camera("horizon rig camera");
        let screen_camera = camera("horizon screen camera");

        let sampler = |label, mode| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: mode,
                address_mode_v: mode,
                address_mode_w: mode,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            })
        };
        let clamp_sampler = sampler("horizon clamp sampler", wgpu::AddressMode::ClampToEdge);
        let repeat_sampler = sampler("horizon repeat sampler", wgpu::AddressMode::Repeat);

        Self {
            device,
            queue,
            surface_format,
            camera_layout,
            rig_camera,
            screen_camera,
            clamp_sampler,
            repeat_sampler,
            scene: None,
            pipelines: HashMap::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Records every pass of `frame` into `encoder`.
    ///
    /// `surface` is the visible surface view; a frame with a surface pass
    /// fails without one.
    pub fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        surface: Option<&wgpu::TextureView>,
        frame: &Frame,
        resources: &FrameResources<'_, GpuTargetAllocator>,
    ) -> Result<()> {
        self.ensure_scene(resources.assembly);

        self.queue
            .write_buffer(&self.rig_camera.0, 0, bytemuck::bytes_of(&frame.camera));
        self.queue
            .write_buffer(&self.screen_camera.0, 0, bytemuck::bytes_of(&frame.screen));

        let materials = &resources.assembly.materials;
        if let Some(scene) = self.scene.as_ref() {
            for id in MaterialId::ALL {
                if let Some(gpu) = scene.materials.get(&id) {
                    self.queue
                        .write_buffer(&gpu.uniforms, 0, materials.get(id).uniform_bytes());
                }
            }
        }

        for pass in &frame.passes {
            let format = match pass.output {
                PassOutput::Target(h) => {
                    resources
                        .targets
                        .storage(h)
                        .ok_or_else(|| anyhow!("{:?} renders into released target {h:?}", pass.id))?
                        .format
                }
                PassOutput::Surface => self.surface_format,
            };

            let scene = resources.assembly.scene(pass.scene);
            for drawable in &scene.drawables {
                self.ensure_pipeline(drawable.material, format, resources.assembly)?;
                self.ensure_bind_group(drawable.material, resources.targets, resources.assembly)?;
            }

            let view = match pass.output {
                PassOutput::Target(h) => resources
                    .targets
                    .storage(h)
                    .map(|t| &t.view)
                    .ok_or_else(|| anyhow!("target {h:?} vanished mid-frame"))?,
                PassOutput::Surface => {
                    surface.ok_or_else(|| anyhow!("{:?} needs the visible surface", pass.id))?
                }
            };
            self.record_pass(encoder, view, format, pass, resources.assembly)?;
        }
        Ok(())
    }

    fn record_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        format: wgpu::TextureFormat,
        pass: &Pass,
        assembly: &SceneAssembly,
    ) -> Result<()> {
        let scene_gpu = self
            .scene
            .as_ref()
            .context("scene resources missing")?;
        let camera = match pass.camera {
            crate::scene::SceneCamera::Rig => &self.rig_camera.1,
            crate::scene::SceneCamera::Screen => &self.screen_camera.1,
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass_label(pass.id)),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(pass.clear.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        rpass.set_bind_group(0, camera, &[]);

        for drawable in &assembly.scene(pass.scene).drawables {
            let pipeline = self
                .pipelines
                .get(&(drawable.material, format))
                .context("pipeline missing")?;
            let bind_group = scene_gpu
                .materials
                .get(&drawable.material)
                .and_then(|m| m.bind_group.as_ref())
                .map(|(_, bg)| bg)
                .context("material bind group missing")?;

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(1, bind_group, &[]);

            if drawable.geometry == GeometryId::Stars {
                if scene_gpu.star_count == 0 {
                    continue;
                }
                rpass.set_vertex_buffer(0, scene_gpu.stars.slice(..));
                rpass.draw(0..SPRITE_VERTICES, 0..scene_gpu.star_count);
            } else {
                let mesh = scene_gpu
                    .meshes
                    .get(&drawable.geometry)
                    .with_context(|| format!("no mesh for {:?}", drawable.geometry))?;
                rpass.set_vertex_buffer(0, mesh.vertices.slice(..));
                rpass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
        Ok(())
    }

    fn ensure_scene(&mut self, assembly: &SceneAssembly) {
        if self.scene.is_some() {
            return;
        }
        let device = &self.device;

        let geometry = &assembly.geometry;
        let mut meshes = HashMap::new();
        for id in [
            GeometryId::ScreenQuad,
            GeometryId::Disc,
            GeometryId::HolePlane,
            GeometryId::LensPlane,
        ] {
            if let Some(mesh) = geometry.mesh(id) {
                meshes.insert(id, GpuMesh::upload(device, "horizon mesh", mesh));
            }
        }

        // A zero-length vertex buffer is not allowed; keep one dummy instance.
        let placeholder = [StarInstance::zeroed()];
        let star_data: &[StarInstance] = if geometry.stars.is_empty() {
            &placeholder
        } else {
            &geometry.stars
        };
        let stars = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("horizon star instances"),
            contents: bytemuck::cast_slice(star_data),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let gradient = device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some("horizon disc gradient"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: DISC_GRADIENT_TEXELS,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &assembly.disc_gradient.bake_rgba8(DISC_GRADIENT_TEXELS),
        );
        let gradient_view = gradient.create_view(&wgpu::TextureViewDescriptor::default());

        let mut materials = HashMap::new();
        for id in MaterialId::ALL {
            let material = assembly.materials.get(id);
            materials.insert(id, self.create_material(id, material));
        }

        log::debug!(
            "uploaded scene resources ({} meshes, {} stars)",
            meshes.len(),
            geometry.stars.len()
        );
        self.scene = Some(SceneResources {
            meshes,
            stars,
            star_count: geometry.stars.len() as u32,
            _gradient: gradient,
            gradient_view,
            materials,
        });
    }

    fn create_material(&self, id: MaterialId, material: &dyn MaterialBinding) -> MaterialGpu {
        let device = &self.device;
        let label = material_label(id);
        let program = material.program();

        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(material.uniform_bytes().len() as u64),
            },
            count: None,
        }];
        for i in 0..material.textures().len() as u32 {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1 + 2 * i,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2 + 2 * i,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &entries,
        });

        let module = |code: &str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(code.into()),
            })
        };

        MaterialGpu {
            layout,
            vertex: module(program.vertex()),
            fragment: module(program.fragment()),
            uniforms: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: material.uniform_bytes(),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            }),
            bind_group: None,
        }
    }

    fn ensure_pipeline(
        &mut self,
        id: MaterialId,
        format: wgpu::TextureFormat,
        assembly: &SceneAssembly,
    ) -> Result<()> {
        if self.pipelines.contains_key(&(id, format)) {
            return Ok(());
        }
        let gpu = self
            .scene
            .as_ref()
            .and_then(|s| s.materials.get(&id))
            .context("material resources missing")?;
        let label = material_label(id);

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[&self.camera_layout, &gpu.layout],
                immediate_size: 0,
            });

        let buffers = if id == MaterialId::Stars {
            [StarInstance::layout()]
        } else {
            [MeshVertex::layout()]
        };

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &gpu.vertex,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &gpu.fragment,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: blend_state(assembly.materials.get(id).blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        log::debug!("created {label} pipeline for {format:?}");
        self.pipelines.insert((id, format), pipeline);
        Ok(())
    }

    /// (Re)builds the material bind group when a sampled target was resized.
    fn ensure_bind_group(
        &mut self,
        id: MaterialId,
        targets: &Targets,
        assembly: &SceneAssembly,
    ) -> Result<()> {
        let material = assembly.materials.get(id);
        let generations = material
            .textures()
            .iter()
            .map(|t| match t.source {
                TextureSource::Target(h) => targets.generation(h).unwrap_or(u64::MAX),
                TextureSource::Gradient => 0,
            })
            .collect::<Vec<_>>();

        let Some(scene) = self.scene.as_mut() else {
            return Err(anyhow!("scene resources missing"));
        };
        let Some(gpu) = scene.materials.get_mut(&id) else {
            return Err(anyhow!("no resources for {id:?}"));
        };
        if gpu
            .bind_group
            .as_ref()
            .is_some_and(|(built, _)| *built == generations)
        {
            return Ok(());
        }

        let mut views = Vec::with_capacity(material.textures().len());
        for binding in material.textures() {
            let view = match binding.source {
                TextureSource::Target(h) => targets
                    .storage(h)
                    .map(|t| &t.view)
                    .ok_or_else(|| anyhow!("{} samples released target {h:?}", binding.name))?,
                TextureSource::Gradient => &scene.gradient_view,
            };
            let sampler = match binding.wrap {
                WrapMode::Clamp => &self.clamp_sampler,
                WrapMode::Repeat => &self.repeat_sampler,
            };
            views.push((view, sampler));
        }

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: gpu.uniforms.as_entire_binding(),
        }];
        for (i, (view, sampler)) in views.iter().enumerate() {
            let i = i as u32;
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + 2 * i,
                resource: wgpu::BindingResource::TextureView(view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + 2 * i,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(material_label(id)),
            layout: &gpu.layout,
            entries: &entries,
        });
        gpu.bind_group = Some((generations, bind_group));
        Ok(())
    }
}

/// [`PassExecutor`] recording into one command encoder.
pub struct GpuPassExecutor<'a> {
    pub renderer: &'a mut GpuRenderer,
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// Visible surface of the current frame; `None` for off-screen work.
    pub surface: Option<&'a wgpu::TextureView>,
}

impl PassExecutor<GpuTargetAllocator> for GpuPassExecutor<'_> {
    fn execute(
        &mut self,
        frame: &Frame,
        resources: &FrameResources<'_, GpuTargetAllocator>,
    ) -> Result<()> {
        self.renderer
            .encode(self.encoder, self.surface, frame, resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_materials_do_not_blend() {
        assert_eq!(blend_state(BlendMode::Opaque), None);
        assert_eq!(
            blend_state(BlendMode::Alpha),
            Some(wgpu::BlendState::ALPHA_BLENDING)
        );
    }

    #[test]
    fn mask_materials_keep_the_strongest_value() {
        let max = blend_state(BlendMode::Max).expect("max blend");
        assert_eq!(max.color.operation, wgpu::BlendOperation::Max);
        assert_eq!(max.alpha.operation, wgpu::BlendOperation::Max);

        let add = blend_state(BlendMode::Additive).expect("additive blend");
        assert_eq!(add.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(add.color.dst_factor, wgpu::BlendFactor::One);
    }
}
