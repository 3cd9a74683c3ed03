//! Operator controls for a running pipeline: the pause kill-switch and the
//! approval decision, both expressed as flag files the engine polls at node
//! boundaries.

use anyhow::{bail, Result};

fn pause_flag() -> String {
    std::env::var("PAUSE_FLAG").unwrap_or_else(|_| "/tmp/factfin-pause".to_string())
}

fn approval_flag() -> String {
    std::env::var("APPROVAL_FLAG").unwrap_or_else(|_| "/tmp/factfin-approval".to_string())
}

fn main() -> Result<()> {
    let command = std::env::args().nth(1).unwrap_or_default();
    match command.as_str() {
        "pause" => {
            std::fs::write(pause_flag(), "")?;
            println!("paused: runs will halt at the next node boundary");
        }
        "unpause" => {
            let _ = std::fs::remove_file(pause_flag());
            println!("unpaused");
        }
        "approve" => {
            std::fs::write(approval_flag(), "approve")?;
            println!("approval recorded");
        }
        "reject" => {
            std::fs::write(approval_flag(), "reject")?;
            println!("rejection recorded");
        }
        "clear" => {
            let _ = std::fs::remove_file(pause_flag());
            let _ = std::fs::remove_file(approval_flag());
            println!("signals cleared");
        }
        "status" => {
            let paused = std::path::Path::new(&pause_flag()).exists();
            let approval = std::fs::read_to_string(approval_flag())
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|_| "absent".to_string());
            println!("paused: {paused}");
            println!("approval: {approval}");
        }
        _ => bail!("usage: operator <pause|unpause|approve|reject|clear|status>"),
    }
    Ok(())
}
