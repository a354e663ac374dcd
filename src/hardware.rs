//! Hardware probing for machine identity.
//!
//! The identity module only needs three optional facts about the machine: a
//! hardware serial string, a machine identifier, and a network adapter
//! address. [`HardwareProbe`] is the seam between those facts and however a
//! platform produces them; [`SystemProbe`] is the default implementation.
//! Hosts with their own fingerprinting (or tests) supply their own probe.

#[cfg(target_os = "linux")]
use std::fs;

/// Source of raw machine-identity inputs, tried in priority order by
/// [`crate::identity::compute_identity`].
pub trait HardwareProbe {
    /// A hardware serial string, e.g. a disk or board serial. `None` or an
    /// empty string when unavailable.
    fn serial_number(&self) -> Option<String>;

    /// A nonzero machine identifier, or `None`.
    fn machine_id(&self) -> Option<u32>;

    /// A nonzero network adapter address folded to 4 bytes, or `None`.
    fn adapter_address(&self) -> Option<u32>;
}

/// Probe backed by the current operating system.
///
/// On Windows, macOS, and Linux this uses different sources to gather the
/// identity inputs. Sources that cannot be read simply report `None`; the
/// identity derivation falls through its priority order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl HardwareProbe for SystemProbe {
    fn serial_number(&self) -> Option<String> {
        read_serial_number().filter(|s| !s.is_empty())
    }

    fn machine_id(&self) -> Option<u32> {
        read_machine_id().filter(|&id| id != 0)
    }

    fn adapter_address(&self) -> Option<u32> {
        read_adapter_address().filter(|&addr| addr != 0)
    }
}

#[cfg(target_os = "linux")]
fn read_serial_number() -> Option<String> {
    for path in [
        "/sys/devices/virtual/dmi/id/product_serial",
        "/sys/devices/virtual/dmi/id/board_serial",
    ] {
        if let Ok(serial) = fs::read_to_string(path) {
            let serial = serial.trim();
            if !serial.is_empty() && serial != "None" {
                return Some(serial.to_string());
            }
        }
    }
    None
}

#[cfg(target_os = "linux")]
fn read_machine_id() -> Option<u32> {
    let text = fs::read_to_string("/etc/machine-id").ok()?;
    let text = text.trim();
    // The machine id is 32 hex chars; fold the leading 8 into a u32.
    u32::from_str_radix(text.get(..8)?, 16).ok()
}

#[cfg(target_os = "linux")]
fn read_adapter_address() -> Option<u32> {
    let entries = fs::read_dir("/sys/class/net").ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if name == "lo" {
            continue;
        }
        let path = entry.path().join("address");
        if let Ok(mac) = fs::read_to_string(path) {
            if let Some(addr) = fold_mac(mac.trim()) {
                return Some(addr);
            }
        }
    }
    None
}

#[cfg(target_os = "macos")]
fn read_serial_number() -> Option<String> {
    use std::process::Command;
    let output = Command::new("ioreg")
        .args(["-rd1", "-c", "IOPlatformExpertDevice"])
        .output()
        .ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    let line = text.lines().find(|l| l.contains("IOPlatformSerialNumber"))?;
    let serial = line.split('"').nth(3)?;
    Some(serial.to_string())
}

#[cfg(target_os = "macos")]
fn read_machine_id() -> Option<u32> {
    None
}

#[cfg(target_os = "macos")]
fn read_adapter_address() -> Option<u32> {
    use std::process::Command;
    let output = Command::new("ifconfig").arg("en0").output().ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    let line = text.lines().find(|l| l.trim_start().starts_with("ether"))?;
    fold_mac(line.split_whitespace().nth(1)?)
}

#[cfg(target_os = "windows")]
fn read_serial_number() -> Option<String> {
    use std::process::Command;
    let output = Command::new("wmic")
        .args(["bios", "get", "serialnumber"])
        .output()
        .ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    let serial = text.lines().nth(1)?.trim();
    if serial.is_empty() {
        None
    } else {
        Some(serial.to_string())
    }
}

#[cfg(target_os = "windows")]
fn read_machine_id() -> Option<u32> {
    use std::process::Command;
    let output = Command::new("reg")
        .args([
            "query",
            r"HKLM\SOFTWARE\Microsoft\Cryptography",
            "/v",
            "MachineGuid",
        ])
        .output()
        .ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    let guid = text.split_whitespace().last()?;
    u32::from_str_radix(guid.get(..8)?, 16).ok()
}

#[cfg(target_os = "windows")]
fn read_adapter_address() -> Option<u32> {
    use std::process::Command;
    let output = Command::new("getmac").arg("/NH").output().ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    fold_mac(text.split_whitespace().next()?)
}

/// Fold a textual MAC address (`aa:bb:cc:dd:ee:ff` or `aa-bb-...`) into its
/// low four bytes.
fn fold_mac(mac: &str) -> Option<u32> {
    let bytes: Vec<u8> = mac
        .split([':', '-'])
        .map(|part| u8::from_str_radix(part, 16))
        .collect::<Result<_, _>>()
        .ok()?;
    if bytes.len() != 6 {
        return None;
    }
    let addr = u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
    if addr == 0 {
        None
    } else {
        Some(addr)
    }
}
