//=========================================================================
// Graphics Capabilities
//=========================================================================
//
// Immutable feature record derived once from the context description the
// backend reports after context creation.
//
// Architecture:
//   RenderBackend::init_context() ──> ContextInfo
//                                        │
//                               Capabilities::derive()
//                                        │
//                         RenderContext.capabilities (render thread)
//
// Each feature is available either through an extension or through a
// core GL version that absorbed it. Framebuffer objects are mandatory.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

use log::{debug, info};

//=== Internal Dependencies ===============================================

use crate::core::error::EngineError;

//=== Constants ===========================================================

const BANNER_WIDTH: usize = 50;

//=== ContextInfo =========================================================

/// What the graphics driver reported for a freshly created context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    /// Core version as `(major, minor)`.
    pub version: (u32, u32),
    /// Full driver version string.
    pub version_string: String,
    pub vendor: String,
    pub renderer: String,
    pub glsl_version: String,
    pub extensions: HashSet<String>,
    pub max_texture_size: u32,
    pub uniform_buffer_offset_alignment: u32,
}

impl ContextInfo {
    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    /// Returns `true` if the core version is at least `major.minor`.
    pub fn is_at_least(&self, major: u32, minor: u32) -> bool {
        self.version >= (major, minor)
    }
}

//=== Capabilities ========================================================

/// Optional rendering features usable on the current context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub direct_state_access: bool,
    pub multi_draw_indirect: bool,
    pub buffer_storage: bool,
    pub clear_buffer: bool,
    pub draw_points_with_gs: bool,
    pub inverse_depth: bool,
    pub nv_multisample_coverage: bool,
    pub synchronous_debug_callback: bool,
    pub generate_draw_calls_via_shader: bool,
    pub occlusion_culling: bool,
    pub temporal_coherence_occlusion_culling: bool,
    pub indirect_draw_count_from_buffer: bool,
    pub representative_fragment_test: bool,
    pub uniform_buffer_offset_alignment: u32,
}

impl Capabilities {
    /// Derives the feature set from `info`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingCapability`] if framebuffer objects are
    /// unavailable.
    pub fn derive(info: &ContextInfo) -> Result<Self, EngineError> {
        let has = |ext: &str| info.has_extension(ext);
        let gl = |major, minor| info.is_at_least(major, minor);

        let framebuffer_objects = has("GL_EXT_framebuffer_object")
            || has("GL_ARB_framebuffer_object")
            || gl(3, 0);
        if !framebuffer_objects {
            return Err(EngineError::MissingCapability(format!(
                "OpenGL 2.0 or higher with the FBO extension is required (OpenGL version: {})",
                info.version_string
            )));
        }

        let multi_draw_indirect = has("GL_ARB_multi_draw_indirect") || gl(4, 3);
        let generate_draw_calls_via_shader = (has("GL_ARB_shader_image_load_store")
            && has("GL_ARB_shader_storage_buffer_object")
            && has("GL_ARB_shader_atomic_counters"))
            || gl(4, 3);

        Ok(Self {
            direct_state_access: (has("GL_ARB_direct_state_access")
                && has("GL_ARB_vertex_attrib_binding"))
                || gl(4, 5),
            multi_draw_indirect,
            buffer_storage: has("GL_ARB_buffer_storage") || gl(4, 4),
            clear_buffer: has("GL_ARB_clear_buffer_object") || gl(4, 3),
            // Point rendering through geometry shaders is only implemented on the MDI path
            draw_points_with_gs: multi_draw_indirect,
            inverse_depth: has("GL_ARB_clip_control") || gl(4, 5),
            nv_multisample_coverage: has("GL_NV_framebuffer_multisample_coverage"),
            synchronous_debug_callback: has("GL_ARB_debug_output") || gl(4, 3),
            generate_draw_calls_via_shader,
            occlusion_culling: generate_draw_calls_via_shader && multi_draw_indirect,
            temporal_coherence_occlusion_culling: true,
            indirect_draw_count_from_buffer: generate_draw_calls_via_shader
                && (has("GL_ARB_indirect_parameters") || gl(4, 6)),
            representative_fragment_test: has("GL_NV_representative_fragment_test"),
            uniform_buffer_offset_alignment: info.uniform_buffer_offset_alignment,
        })
    }
}

//=== Context Summary =====================================================

/// Logs the engine banner, driver details and (at debug level) the capability dump.
pub fn log_context_summary(title: &str, version: &str, info: &ContextInfo, caps: &Capabilities) {
    info!(target: "lifecycle", "{}", pad_both("[ Engine ]", BANNER_WIDTH, '='));
    info!(target: "lifecycle", "Starting {} v{}", title, version);
    info!(target: "lifecycle", "OS: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
    info!(target: "lifecycle", "OpenGL Vendor: {}", info.vendor);
    info!(target: "lifecycle", "Driver Version: {}", info.version_string);
    info!(target: "lifecycle", "OpenGL Renderer: {}", info.renderer);
    info!(target: "lifecycle", "GLSL Version: {}", info.glsl_version);
    info!(target: "lifecycle", "Max Texture Size: {}", info.max_texture_size);

    debug!(target: "lifecycle", "{}", pad_both("[ Capabilities ]", BANNER_WIDTH, '='));
    debug!(target: "lifecycle", "DirectStateAccess: {}", caps.direct_state_access);
    debug!(target: "lifecycle", "MultiDrawIndirect: {}", caps.multi_draw_indirect);
    debug!(target: "lifecycle", "BufferStorage: {}", caps.buffer_storage);
    debug!(target: "lifecycle", "ClearBuffer: {}", caps.clear_buffer);
    debug!(target: "lifecycle", "InverseDepth: {}", caps.inverse_depth);
    debug!(target: "lifecycle", "NvMultisampleCoverage: {}", caps.nv_multisample_coverage);
    debug!(target: "lifecycle", "SynchronousDebugCallback: {}", caps.synchronous_debug_callback);
    debug!(target: "lifecycle", "GenerateDrawCallsViaShader: {}", caps.generate_draw_calls_via_shader);
    debug!(target: "lifecycle", "OcclusionCulling: {}", caps.occlusion_culling);
    debug!(target: "lifecycle", "RepresentativeFragmentTest: {}", caps.representative_fragment_test);
    debug!(
        target: "lifecycle",
        "UniformBufferOffsetAlignment: {}",
        caps.uniform_buffer_offset_alignment
    );
}

/// Centers `text` in a line of `width` columns filled with `fill`.
///
/// Odd padding puts the extra column on the right.
fn pad_both(text: &str, width: usize, fill: char) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }

    let total = width - len;
    let left = total / 2;
    let right = total - left;

    let mut line = String::with_capacity(width);
    line.extend(std::iter::repeat(fill).take(left));
    line.push_str(text);
    line.extend(std::iter::repeat(fill).take(right));
    line
}

//=========================================================================
// Unit Tests
//=========================================================================
