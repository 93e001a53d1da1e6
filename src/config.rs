use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub detector: Detector,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub jobs_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            jobs_dir: "data/jobs".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorBackend {
    #[default]
    Cascade,
    Neural,
}

impl DetectorBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorBackend::Cascade => "cascade",
            DetectorBackend::Neural => "neural",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detector {
    #[serde(default)]
    pub backend: DetectorBackend,
    #[serde(default)]
    pub cascade: Cascade,
    #[serde(default)]
    pub neural: Neural,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Cascade {
    pub model_path: String,
    pub min_face_size: u32,
    /// Image pyramid step between scales; 1.1 shrinks each level by ~9%.
    pub scale_step: f32,
    /// Minimum cascade score for a merged window to count as a face.
    pub min_score: f64,
    pub window_step: u32,
}
impl Default for Cascade {
    fn default() -> Self {
        Self {
            model_path: "models/seeta_fd_frontal_v1.0.bin".into(),
            min_face_size: 20,
            scale_step: 1.1,
            min_score: 2.0,
            window_step: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Neural {
    pub model_path: String,
    pub input_width: u32,
    pub input_height: u32,
    pub candidate_threshold: f32,
    pub nms_iou: f32,
    pub primary_threshold: f32,
    pub fallback_threshold: f32,
    pub intra_threads: usize,
}
impl Default for Neural {
    fn default() -> Self {
        Self {
            model_path: "models/version-RFB-320.onnx".into(),
            input_width: 320,
            input_height: 240,
            candidate_threshold: 0.1,
            nms_iou: 0.3,
            primary_threshold: 0.6,
            fallback_threshold: 0.3,
            intra_threads: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Quality {
    pub render_preview: bool,
}
impl Default for Quality {
    fn default() -> Self {
        Self {
            render_preview: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub enabled: bool,
    pub min_passed_photos: usize,
}
impl Default for Policy {
    fn default() -> Self {
        Self {
            enabled: true,
            min_passed_photos: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub addr: String,
    pub max_body_bytes: usize,
}
impl Default for Server {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8000".into(),
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Debug {
    pub dump_effective_config: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            dump_effective_config: false,
        }
    }
}
