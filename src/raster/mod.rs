//! Scene rasterization through an injected shading pipeline.
//!
//! Rasterizing a scene takes two walks over the graph:
//!
//! ```text
//! ┌──────────────┐  Renderables  ┌──────────────┐  uniforms + draws  ┌──────────────────┐
//! │  RasterSetup │──────────────▶│  RasterPass  │───────────────────▶│  ShadingPipeline │
//! │  (once/node) │               │  (per frame) │                    │  (GPU or record) │
//! └──────────────┘               └──────────────┘                    └──────────────────┘
//! ```
//!
//! - [`RasterSetup`] builds [`Geometry`](crate::geometry::Geometry), a
//!   bounding sphere and a pipeline mesh for every primitive that does not
//!   have them yet
//! - [`RasterPass`] uploads frame uniforms, then model and normal matrices
//!   per leaf, and issues one draw per primitive
//!
//! The passes never touch a GPU API directly. The wgpu backend lives in
//! [`gpu_pipeline`](crate::gpu_pipeline).
//!
//! # Example
//!
//! ```ignore
//! let mut renderables = Renderables::new();
//! RasterSetup::new(&config).run(&graph, &mut pipeline, &mut renderables);
//!
//! // Each frame:
//! collector.collect(&graph);
//! RasterPass::new(config.phong).render(&graph, &mut pipeline, &renderables, &collector);
//! ```

mod pass;
pub mod pipeline;
mod setup;

pub use pass::RasterPass;
pub use pipeline::{MAX_LIGHTS, Program, ShadingPipeline, Uniform};
pub use setup::{RasterSetup, Renderable, Renderables};
