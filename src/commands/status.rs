//! Status command - reports the init system's view of each managed unit.

use anyhow::Result;

use crate::activate::{InitSystem, Systemctl};
use crate::config::Config;
use crate::plan::UNIT_TEMPLATES;

/// Execute the status command. Returns false if any unit is not active.
pub fn cmd_status(config: &Config) -> Result<bool> {
    let init = Systemctl::new(&config.systemctl);
    let mut all_active = true;

    for name in UNIT_TEMPLATES {
        let state = init.is_active(name)?;
        all_active &= state == "active";
        println!("  {:<32} {}", name, state);
    }

    Ok(all_active)
}
