use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENGINE: &str = "whisper";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_JOBS: usize = 2;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Executable name or path. Bare names are looked up on `PATH`.
    pub program: PathBuf,
    /// Directory holding per-request audio and engine output files.
    pub work_dir: PathBuf,
    pub timeout: Duration,
    pub max_jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_ENGINE),
            work_dir: default_work_dir(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_jobs: DEFAULT_MAX_JOBS,
        }
    }
}

impl EngineConfig {
    /// Resolves the engine executable and prepares the work dir. Run once at
    /// startup so a bad install fails loudly instead of on the first upload.
    pub fn prepare(&self) -> Result<EngineConfig> {
        let program = resolve_program(&self.program)?;
        std::fs::create_dir_all(&self.work_dir).with_context(|| {
            format!("Failed to create work dir {}", self.work_dir.display())
        })?;
        let work_dir = self
            .work_dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve work dir {}", self.work_dir.display()))?;

        if self.max_jobs == 0 {
            return Err(anyhow!("max_jobs must be at least 1"));
        }

        Ok(EngineConfig {
            program,
            work_dir,
            timeout: self.timeout,
            max_jobs: self.max_jobs,
        })
    }
}

pub fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("wav-transcribe")
}

fn resolve_program(program: &Path) -> Result<PathBuf> {
    if program.components().count() > 1 {
        return check_executable(program).map(|_| program.to_path_buf());
    }

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| check_executable(candidate).is_ok())
        .ok_or_else(|| anyhow!("Engine {:?} not found on PATH", program))
}

fn check_executable(path: &Path) -> Result<()> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Engine not found at {}", path.display()))?;
    if !meta.is_file() {
        return Err(anyhow!("Engine path {} is not a file", path.display()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            return Err(anyhow!("Engine {} is not executable", path.display()));
        }
    }

    Ok(())
}
