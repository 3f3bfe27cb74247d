//! エンジンのサブプロセス管理
//!
//! 標準出力はバックグラウンドスレッドで 1 行ずつ読み、チャネル経由で受け取る。
//! 標準エラーは debug ログへ流す。エンジンは独自のプロセスグループで起動し、
//! 終了時はグループごと落とす。

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, trace};

use crate::error::EngineError;

const QUIT_TIMEOUT: Duration = Duration::from_millis(300);
const QUIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 起動処理を直列化する
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

/// 行単位のエンジン入出力
///
/// セッション層はこの trait だけに依存するため、テストでは台本どおりに応答する
/// 実装に差し替えられる。
pub trait Transport {
    fn send_line(&mut self, line: &str) -> Result<(), EngineError>;

    /// 次の 1 行を待つ。ストリームが閉じていれば `EngineError::Protocol`。
    fn recv_line(&mut self) -> Result<String, EngineError>;

    /// 何度呼んでもよい
    fn close(&mut self);
}

/// 1 本のエンジンプロセス
pub struct EngineProcess {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    rx: Receiver<String>,
    pid: u32,
    closed: bool,
}

impl EngineProcess {
    /// エンジンを起動する。区切り文字を含む相対パスは `working_dir` 基準で解決する。
    pub fn start(
        program: &Path,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> Result<EngineProcess, EngineError> {
        let program = resolve_program(program, working_dir);
        let mut cmd = Command::new(&program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        isolate_process_group(&mut cmd);

        let mut child = {
            let _guard = SPAWN_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            cmd.spawn().map_err(|source| EngineError::Launch {
                program: program.display().to_string(),
                source,
            })?
        };
        let pid = child.id();

        let launch_error = |what: &str| EngineError::Launch {
            program: program.display().to_string(),
            source: std::io::Error::other(format!("no {what} pipe")),
        };
        let stdin = child.stdin.take().ok_or_else(|| launch_error("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| launch_error("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| launch_error("stderr"))?;

        let (tx, rx) = mpsc::channel::<String>();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                match line {
                    Ok(l) => {
                        if tx.send(l).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });
        thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                debug!("{pid} stderr: {line}");
            }
        });

        debug!("started engine {} (pid {pid})", program.display());
        Ok(EngineProcess {
            child,
            stdin: BufWriter::new(stdin),
            rx,
            pid,
            closed: false,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// プロセスグループを終了させ、残りの出力を捨てて終了を待つ。
    /// 失敗はログに残すだけで返さない。
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let _ = self.write_raw("quit");
        let deadline = Instant::now() + QUIT_TIMEOUT;
        while Instant::now() < deadline {
            if let Ok(Some(_)) = self.child.try_wait() {
                break;
            }
            thread::sleep(QUIT_POLL_INTERVAL);
        }
        if let Ok(None) = self.child.try_wait() {
            if let Err(err) = kill_process_group(&mut self.child) {
                error!("failed to kill engine {}: {err}", self.pid);
            }
        }
        for line in self.rx.try_iter() {
            trace!("{} >> {line} (discarded)", self.pid);
        }
        if let Err(err) = self.child.wait() {
            error!("failed to wait for engine {}: {err}", self.pid);
        }
        debug!("engine {} terminated", self.pid);
    }

    fn write_raw(&mut self, line: &str) -> std::io::Result<()> {
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()
    }
}

impl Transport for EngineProcess {
    fn send_line(&mut self, line: &str) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::protocol("engine already shut down"));
        }
        trace!("{} << {line}", self.pid);
        self.write_raw(line)?;
        Ok(())
    }

    fn recv_line(&mut self) -> Result<String, EngineError> {
        let line = self
            .rx
            .recv()
            .map_err(|_| EngineError::protocol(format!("engine {} closed its output", self.pid)))?;
        trace!("{} >> {line}", self.pid);
        Ok(line)
    }

    fn close(&mut self) {
        self.shutdown();
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn resolve_program(program: &Path, working_dir: Option<&Path>) -> PathBuf {
    let has_separator = program.components().count() > 1;
    match working_dir {
        Some(dir) if program.is_relative() && has_separator => dir.join(program),
        _ => program.to_path_buf(),
    }
}

#[cfg(unix)]
fn isolate_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // SAFETY: `setpgid` は async-signal-safe で、fork 後の子プロセスでのみ呼ばれる
    unsafe {
        cmd.pre_exec(|| {
            if libc::setpgid(0, 0) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(windows)]
fn isolate_process_group(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    cmd.creation_flags(windows_sys::Win32::System::Threading::CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn isolate_process_group(_cmd: &mut Command) {}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) -> std::io::Result<()> {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: 自分で起動したプロセスグループへのシグナル送信のみ
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        let err = std::io::Error::last_os_error();
        // グループが既に消えていれば本体だけ落とす
        if err.raw_os_error() == Some(libc::ESRCH) {
            return child.kill();
        }
        return Err(err);
    }
    Ok(())
}

#[cfg(windows)]
fn kill_process_group(child: &mut Child) -> std::io::Result<()> {
    use windows_sys::Win32::System::Console::{CTRL_BREAK_EVENT, GenerateConsoleCtrlEvent};
    // SAFETY: CREATE_NEW_PROCESS_GROUP で作ったグループ ID（= pid）にのみ送る
    if unsafe { GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, child.id()) } == 0 {
        return child.kill();
    }
    Ok(())
}

#[cfg(not(any(unix, windows)))]
fn kill_process_group(child: &mut Child) -> std::io::Result<()> {
    child.kill()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_program_relative_to_working_dir() {
        let dir = Path::new("/opt/engines");
        assert_eq!(
            resolve_program(Path::new("bin/pikafish"), Some(dir)),
            PathBuf::from("/opt/engines/bin/pikafish")
        );
        // 区切りのない名前は PATH 検索に任せる
        assert_eq!(
            resolve_program(Path::new("pikafish"), Some(dir)),
            PathBuf::from("pikafish")
        );
        assert_eq!(
            resolve_program(Path::new("/usr/bin/fairy-stockfish"), Some(dir)),
            PathBuf::from("/usr/bin/fairy-stockfish")
        );
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let err = EngineProcess::start(Path::new("/nonexistent/engine-binary"), &[], None)
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Launch { .. }));
    }
}
