use std::fs;
use std::path::{Path, PathBuf};

use ash::vk;
use log::debug;

use crate::gpu::{ShaderModule, ShaderStage, SharedDevice, Unique};
use crate::{Error, RendererConfig, Result};

/// Compiled SPIR-V module together with the entry point and stage it gets
/// plugged into a pipeline with.
#[derive(Debug)]
pub struct Shader {
    module: Unique<ShaderModule>,
    entry_point: String,
    stage: vk::ShaderStageFlags,
}

impl Shader {
    pub fn load(
        device: &SharedDevice,
        path: impl AsRef<Path>,
        entry_point: impl ToString,
        stage: vk::ShaderStageFlags,
    ) -> Result<Self> {
        let path = path.as_ref();
        let code = Self::validate(path)?;

        debug!("Loading shader: {}", path.display());

        let module = device.create_shader_module(&code)?;

        Ok(Self {
            module: Unique::new(device, module),
            entry_point: entry_point.to_string(),
            stage,
        })
    }

    /// Reads a SPIR-V binary and checks that it's non-empty and made of whole
    /// words, returning the words.
    pub fn validate(path: impl AsRef<Path>) -> Result<Vec<u32>> {
        let path = path.as_ref();

        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;

        if bytes.is_empty() {
            return Err(Error::EmptyShader {
                path: path.to_owned(),
            });
        }

        if bytes.len() % 4 != 0 {
            return Err(Error::MisalignedShader {
                path: path.to_owned(),
                len: bytes.len(),
            });
        }

        Ok(bytes
            .chunks_exact(4)
            .map(|word| {
                u32::from_ne_bytes([word[0], word[1], word[2], word[3]])
            })
            .collect())
    }

    pub fn module(&self) -> ShaderModule {
        self.module.get()
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn stage(&self) -> ShaderStage {
        ShaderStage {
            module: self.module.get(),
            entry_point: self.entry_point.clone(),
            stage: self.stage,
        }
    }
}

/// Names of every shader binary the frame graph can use.
pub struct ShaderSet;

impl ShaderSet {
    pub const EMISSIVE_SAMPLE: &'static str = "emissiveSample.comp.spv";
    pub const GBUFFER_VERT: &'static str = "gBuffer.vert.spv";
    pub const GBUFFER_FRAG: &'static str = "gBuffer.frag.spv";
    pub const GBUFFER_SDF: &'static str = "gBufferSdf.comp.spv";
    pub const RESTIR: &'static str = "restirOmni.comp.spv";
    pub const RESTIR_SOFTWARE: &'static str = "restirOmniSoftware.comp.spv";
    pub const UNBIASED_REUSE: &'static str = "unbiasedReuse.comp.spv";
    pub const UNBIASED_REUSE_SOFTWARE: &'static str =
        "unbiasedReuseSoftware.comp.spv";

    /// Paths of the binaries needed by `config`, in frame-graph order.
    pub fn paths(config: &RendererConfig) -> Vec<PathBuf> {
        let mut names = Vec::new();

        if config.gbuffer.is_compute() {
            names.push(Self::GBUFFER_SDF);
        } else {
            names.push(Self::GBUFFER_VERT);
            names.push(Self::GBUFFER_FRAG);
        }

        names.push(Self::EMISSIVE_SAMPLE);

        if config.tracing.is_enabled() {
            names.push(Self::RESTIR_SOFTWARE);
            names.push(Self::UNBIASED_REUSE_SOFTWARE);
        } else {
            names.push(Self::RESTIR);
            names.push(Self::UNBIASED_REUSE);
        }

        names
            .into_iter()
            .map(|name| config.shader_path(name))
            .collect()
    }

    /// Checks every binary needed by `config` without touching the GPU.
    pub fn validate(config: &RendererConfig) -> Result<()> {
        for path in Self::paths(config) {
            Shader::validate(&path)?;
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::ops::Deref;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::{env, process};

    use super::*;
    use crate::gpu::testing::FakeGpu;
    use crate::{GBufferMode, TracingMode};

    /// Temporary directory holding every shader binary; removed on drop.
    #[derive(Debug)]
    pub struct ShaderDir(PathBuf);

    impl Deref for ShaderDir {
        type Target = Path;

        fn deref(&self) -> &Path {
            &self.0
        }
    }

    impl From<&ShaderDir> for PathBuf {
        fn from(dir: &ShaderDir) -> Self {
            dir.0.clone()
        }
    }

    impl Drop for ShaderDir {
        fn drop(&mut self) {
            _ = fs::remove_dir_all(&self.0);
        }
    }

    /// Creates a fresh directory with every shader binary, each `len` bytes.
    pub fn shader_dir(len: usize) -> ShaderDir {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

        let dir = env::temp_dir().join(format!(
            "restir-shaders-{}-{}",
            process::id(),
            NEXT_ID.fetch_add(1, Ordering::Relaxed)
        ));

        fs::create_dir_all(dir.join("shaders")).unwrap();

        for name in [
            ShaderSet::EMISSIVE_SAMPLE,
            ShaderSet::GBUFFER_VERT,
            ShaderSet::GBUFFER_FRAG,
            ShaderSet::GBUFFER_SDF,
            ShaderSet::RESTIR,
            ShaderSet::RESTIR_SOFTWARE,
            ShaderSet::UNBIASED_REUSE,
            ShaderSet::UNBIASED_REUSE_SOFTWARE,
        ] {
            fs::write(dir.join("shaders").join(name), vec![0x03; len]).unwrap();
        }

        ShaderDir(dir)
    }

    #[test]
    fn shader_dir_is_removed_on_drop() {
        let dir = shader_dir(4);
        let path = dir.to_path_buf();

        assert!(path.join("shaders").join(ShaderSet::RESTIR).exists());

        drop(dir);

        assert!(!path.exists());
    }

    #[test]
    fn load() {
        let gpu = FakeGpu::new();
        let dir = shader_dir(16);

        let shader = Shader::load(
            &gpu.device(),
            dir.join("shaders").join(ShaderSet::RESTIR),
            "main",
            vk::ShaderStageFlags::COMPUTE,
        )
        .unwrap();

        let stage = shader.stage();

        assert_eq!("main", stage.entry_point);
        assert_eq!(vk::ShaderStageFlags::COMPUTE, stage.stage);
        assert_eq!(shader.module(), stage.module);
        assert!(gpu.is_alive(shader.module()));

        let module = shader.module();

        drop(shader);

        assert!(!gpu.is_alive(module));
    }

    #[test]
    fn empty() {
        let gpu = FakeGpu::new();
        let dir = shader_dir(0);

        let err = Shader::load(
            &gpu.device(),
            dir.join("shaders").join(ShaderSet::RESTIR),
            "main",
            vk::ShaderStageFlags::COMPUTE,
        )
        .unwrap_err();

        assert!(matches!(err, Error::EmptyShader { .. }));
        assert_eq!(0, gpu.alive_count());
    }

    #[test]
    fn misaligned() {
        let gpu = FakeGpu::new();
        let dir = shader_dir(13);

        let err = Shader::load(
            &gpu.device(),
            dir.join("shaders").join(ShaderSet::RESTIR),
            "main",
            vk::ShaderStageFlags::COMPUTE,
        )
        .unwrap_err();

        assert!(matches!(err, Error::MisalignedShader { len: 13, .. }));
    }

    #[test]
    fn missing() {
        let err = Shader::validate("/definitely/not/here.spv").unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn validate_set() {
        let dir = shader_dir(8);

        let config = RendererConfig::default()
            .with_shader_dir(&dir)
            .with_gbuffer(GBufferMode::Compute)
            .with_tracing(TracingMode::Disabled);

        ShaderSet::validate(&config).unwrap();

        assert_eq!(
            vec![
                dir.join("shaders/gBufferSdf.comp.spv"),
                dir.join("shaders/emissiveSample.comp.spv"),
                dir.join("shaders/restirOmni.comp.spv"),
                dir.join("shaders/unbiasedReuse.comp.spv"),
            ],
            ShaderSet::paths(&config)
        );

        fs::write(dir.join("shaders").join(ShaderSet::RESTIR), [0; 5]).unwrap();

        assert!(matches!(
            ShaderSet::validate(&config),
            Err(Error::MisalignedShader { len: 5, .. })
        ));
    }
}
