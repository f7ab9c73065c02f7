//! Durable found-key reporting.
//!
//! The record is written and fsynced before the stop flag is raised, and a
//! write failure falls back to stderr: whatever happens, the private key
//! appears somewhere the operator can recover it.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::puzzle::PrivKey;

/// Fixed path of the found-key record, the only handshake with the
/// monitoring siblings that poll for it.
pub const FOUND_KEY_FILE: &str = "FOUND_KEY.txt";

#[derive(Clone)]
pub struct FoundKey {
    pub key: PrivKey,
    pub address: String,
    pub h160: [u8; 20],
    pub total_keys: u64,
    pub found_at: DateTime<Local>,
}

impl FoundKey {
    /// The on-disk record, one field per line.
    pub fn render(&self) -> String {
        format!(
            "PUZZLE #71 SOLUTION\n\
             Private Key: {}\n\
             Target: {}\n\
             Hash160: {}\n\
             Found: {}\n\
             Total keys checked: {}\n",
            self.key.hex(),
            self.address,
            hex::encode(self.h160),
            self.found_at.format("%a %b %e %H:%M:%S %Y"),
            self.total_keys
        )
    }
}

/// Write the record and force it to stable storage.
pub fn write_record(record: &FoundKey, path: &Path) -> Result<()> {
    let mut f = File::create(path)?;
    f.write_all(record.render().as_bytes())?;
    f.flush()?;
    f.sync_all()?;
    Ok(())
}

/// Console banner plus the durable write. If the file cannot be written the
/// full record goes to stderr instead; the key must never be lost.
pub fn publish(record: &FoundKey) {
    println!("\n============================================================");
    println!("  PUZZLE #71 KEY FOUND!");
    println!("  Private Key: {}", record.key.hex());
    println!("============================================================");
    std::io::stdout().flush().ok();

    match write_record(record, Path::new(FOUND_KEY_FILE)) {
        Ok(()) => println!("[✓] Record written to {}", FOUND_KEY_FILE),
        Err(e) => {
            eprintln!("[✗] Could not write {}: {}", FOUND_KEY_FILE, e);
            eprintln!("{}", record.render());
        }
    }
}

/// Re-write the record to every backup location the caller asked for.
pub fn copy_to_backups(record: &FoundKey, backups: &[PathBuf]) {
    for path in backups {
        match write_record(record, path) {
            Ok(()) => println!("[✓] Backup copy written to {}", path.display()),
            Err(e) => eprintln!("[✗] Backup {} failed: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{RANGE_LOW, TARGET_ADDRESS, TARGET_H160};

    fn sample() -> FoundKey {
        FoundKey {
            key: RANGE_LOW.add_offset(0x42),
            address: TARGET_ADDRESS.to_string(),
            h160: TARGET_H160,
            total_keys: 67,
            found_at: Local::now(),
        }
    }

    #[test]
    fn test_record_layout() {
        let lines: Vec<String> = sample().render().lines().map(String::from).collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "PUZZLE #71 SOLUTION");
        assert_eq!(lines[1], "Private Key: 0x400000000000000042");
        assert_eq!(lines[2], format!("Target: {}", TARGET_ADDRESS));
        assert_eq!(
            lines[3],
            "Hash160: f6f5431d25bbf7b12e8add9af5e3475c44a0a5b8"
        );
        assert!(lines[4].starts_with("Found: "));
        assert_eq!(lines[5], "Total keys checked: 67");
    }

    #[test]
    fn test_write_and_backups() {
        let dir = std::env::temp_dir();
        let primary = dir.join("puzzle71_record_test.txt");
        let backup = dir.join("puzzle71_record_test_backup.txt");
        let record = sample();

        write_record(&record, &primary).unwrap();
        copy_to_backups(&record, &[backup.clone()]);

        let a = std::fs::read_to_string(&primary).unwrap();
        let b = std::fs::read_to_string(&backup).unwrap();
        assert_eq!(a, record.render());
        assert_eq!(a, b);

        std::fs::remove_file(primary).ok();
        std::fs::remove_file(backup).ok();
    }
}
