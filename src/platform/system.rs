//! Platform primitives backed by the running OS.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use sysinfo::{
    CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System, Users,
};
use tokio::process::Command;

use super::jokes;
use super::{
    MonitorSnapshot, Platform, PowerAction, PrimitiveError, ProcessEntry, Result, ShellOutput,
    SystemSnapshot, VolumeKey,
};

/// Delay Windows gives before a scheduled shutdown.
const WINDOWS_POWER_DELAY: Duration = Duration::from_secs(30);

/// `shutdown +1` on Unix schedules one minute out.
const UNIX_POWER_DELAY: Duration = Duration::from_secs(60);

/// Primitives that act on the local machine.
pub struct SystemPlatform;

impl SystemPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemPlatform {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a program and fail on non-zero exit.
async fn run_checked(program: &str, args: &[&str]) -> Result<std::process::Output> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PrimitiveError::Unavailable(program.to_string()),
            _ => PrimitiveError::Io(e),
        })?;

    if !output.status.success() {
        return Err(PrimitiveError::CommandFailed {
            command: format!("{} {}", program, args.join(" ")),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    tracing::debug!("Ran {} {:?}", program, args);
    Ok(output)
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PrimitiveError::other(format!("Worker failed: {}", e)))
}

fn percent(part: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64 * 100.0) as f32
    }
}

/// CPU, memory and root-disk utilization. Blocks for the CPU sample window.
fn sample_utilization() -> (f32, f32, f32) {
    let mut sys = System::new_with_specifics(
        RefreshKind::new()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything()),
    );
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_all();

    let disks = Disks::new_with_refreshed_list();
    let root = disks.iter().find(|d| d.mount_point() == Path::new("/"));
    let (disk_used, disk_total) = match root {
        Some(disk) => (
            disk.total_space().saturating_sub(disk.available_space()),
            disk.total_space(),
        ),
        None => disks.iter().fold((0u64, 0u64), |(used, total), disk| {
            (
                used + disk.total_space().saturating_sub(disk.available_space()),
                total + disk.total_space(),
            )
        }),
    };

    (
        sys.global_cpu_usage(),
        percent(sys.used_memory(), sys.total_memory()),
        percent(disk_used, disk_total),
    )
}

fn powershell_screenshot_script(path: &Path) -> String {
    format!(
        "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
         $b = [System.Windows.Forms.Screen]::PrimaryScreen.Bounds; \
         $bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
         $g = [System.Drawing.Graphics]::FromImage($bmp); \
         $g.CopyFromScreen($b.Location, [System.Drawing.Point]::Empty, $b.Size); \
         $bmp.Save('{}')",
        path.display().to_string().replace('\'', "''")
    )
}

#[async_trait]
impl Platform for SystemPlatform {
    async fn open_path(&self, target: &str) -> Result<()> {
        let path = PathBuf::from(target);
        if !path.exists() {
            return Err(PrimitiveError::NotFound(target.to_string()));
        }
        blocking(move || open::that(&path)).await??;
        Ok(())
    }

    async fn open_url(&self, url: &str) -> Result<()> {
        let url = url.to_string();
        blocking(move || open::that(&url)).await??;
        Ok(())
    }

    async fn press_volume_key(&self, key: VolumeKey) -> Result<()> {
        if cfg!(target_os = "windows") {
            let code = match key {
                VolumeKey::Up => 175,
                VolumeKey::Down => 174,
                VolumeKey::Mute => 173,
            };
            let script = format!(
                "(New-Object -ComObject WScript.Shell).SendKeys([char]{})",
                code
            );
            run_checked("powershell", &["-NoProfile", "-Command", script.as_str()]).await?;
        } else if cfg!(target_os = "macos") {
            let script = match key {
                VolumeKey::Up => {
                    "set volume output volume ((output volume of (get volume settings)) + 6)"
                }
                VolumeKey::Down => {
                    "set volume output volume ((output volume of (get volume settings)) - 6)"
                }
                VolumeKey::Mute => {
                    "set volume output muted not (output muted of (get volume settings))"
                }
            };
            run_checked("osascript", &["-e", script]).await?;
        } else {
            let keysym = match key {
                VolumeKey::Up => "XF86AudioRaiseVolume",
                VolumeKey::Down => "XF86AudioLowerVolume",
                VolumeKey::Mute => "XF86AudioMute",
            };
            run_checked("xdotool", &["key", keysym]).await?;
        }
        Ok(())
    }

    async fn power(&self, action: PowerAction) -> Result<Duration> {
        if cfg!(target_os = "windows") {
            let flag = match action {
                PowerAction::Shutdown => "/s",
                PowerAction::Restart => "/r",
            };
            run_checked("shutdown", &[flag, "/t", "30"]).await?;
            Ok(WINDOWS_POWER_DELAY)
        } else if cfg!(unix) {
            let flag = match action {
                PowerAction::Shutdown => "-h",
                PowerAction::Restart => "-r",
            };
            run_checked("shutdown", &[flag, "+1"]).await?;
            Ok(UNIX_POWER_DELAY)
        } else {
            Err(PrimitiveError::Unsupported("Power control".to_string()))
        }
    }

    async fn run_shell(&self, command: &str) -> Result<ShellOutput> {
        let (shell, flag) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let output = Command::new(shell)
            .args([flag, command])
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status.code(),
        })
    }

    async fn list_processes(&self) -> Result<Vec<ProcessEntry>> {
        blocking(|| {
            let mut sys = System::new_all();
            sys.refresh_all();
            let users = Users::new_with_refreshed_list();

            let mut entries: Vec<ProcessEntry> = sys
                .processes()
                .values()
                .map(|p| ProcessEntry {
                    pid: p.pid().as_u32(),
                    name: p.name().to_string_lossy().to_string(),
                    user: p
                        .user_id()
                        .and_then(|uid| users.get_user_by_id(uid))
                        .map(|u| u.name().to_string()),
                })
                .collect();
            entries.sort_by_key(|e| e.pid);
            entries
        })
        .await
    }

    async fn monitor_snapshot(&self) -> Result<MonitorSnapshot> {
        blocking(|| {
            let (cpu, memory, disk) = sample_utilization();
            let networks = Networks::new_with_refreshed_list();
            let (sent, received) = networks.list().values().fold((0u64, 0u64), |(s, r), data| {
                (s + data.total_transmitted(), r + data.total_received())
            });

            MonitorSnapshot {
                cpu_percent: cpu,
                memory_percent: memory,
                disk_percent: disk,
                bytes_sent: sent,
                bytes_received: received,
            }
        })
        .await
    }

    async fn system_snapshot(&self) -> Result<SystemSnapshot> {
        blocking(|| {
            let (cpu, memory, disk) = sample_utilization();
            SystemSnapshot {
                os_name: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
                os_version: System::os_version().unwrap_or_default(),
                cpu_percent: cpu,
                memory_percent: memory,
                disk_percent: disk,
            }
        })
        .await
    }

    async fn capture_screen(&self, path: &Path) -> Result<()> {
        let target = path.display().to_string();
        if cfg!(target_os = "windows") {
            let script = powershell_screenshot_script(path);
            run_checked("powershell", &["-NoProfile", "-Command", script.as_str()]).await?;
        } else if cfg!(target_os = "macos") {
            run_checked("screencapture", &["-x", target.as_str()]).await?;
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            run_checked("grim", &[target.as_str()]).await?;
        } else {
            run_checked("scrot", &[target.as_str()]).await?;
        }
        Ok(())
    }

    async fn lock_screen(&self) -> Result<()> {
        if cfg!(target_os = "windows") {
            run_checked("rundll32.exe", &["user32.dll,LockWorkStation"]).await?;
        } else if cfg!(target_os = "macos") {
            run_checked("pmset", &["displaysleepnow"]).await?;
        } else if cfg!(target_os = "linux") {
            run_checked("loginctl", &["lock-session"]).await?;
        } else {
            return Err(PrimitiveError::Unsupported("Screen lock".to_string()));
        }
        Ok(())
    }

    async fn tell_joke(&self) -> Result<String> {
        Ok(jokes::random_joke().to_string())
    }
}
