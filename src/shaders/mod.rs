//! Embedded WGSL sources

/// Textured, optionally lit surface shader used for every scene draw
pub const SCENE_SHADER: &str = include_str!("scene.wgsl");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_shader_entry_points() {
        assert!(SCENE_SHADER.contains("fn vs_main"));
        assert!(SCENE_SHADER.contains("fn fs_main"));
    }
}
