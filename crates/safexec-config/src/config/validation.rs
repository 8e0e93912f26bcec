use anyhow::{Result, bail};

use super::Config;

/// Reject variable names the OS cannot represent.
fn validate_env_name(key: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Invalid {key}: environment variable name must not be empty");
    }
    if name.contains('=') || name.contains('\0') {
        bail!("Invalid {key}: environment variable name '{name}' contains '=' or NUL");
    }
    Ok(())
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(cwd) = &self.spawn.cwd
            && cwd.as_os_str().is_empty()
        {
            bail!("Invalid cwd: must not be empty");
        }

        for (name, value) in &self.spawn.env {
            validate_env_name("env", name)?;
            if value.contains('\0') {
                bail!("Invalid env: value of '{name}' contains NUL");
            }
        }

        for name in &self.spawn.env_remove {
            validate_env_name("env_remove", name)?;
        }

        Ok(())
    }
}
