use std::{
    io,
    os::unix::process::CommandExt,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
};

use crate::util::{error::FlightResult, time::get_unix_time_seconds};

/// A camera recording running in its own process group, so the terminal's
/// Ctrl-C reaches only the controller and the recording is stopped in order.
pub struct VideoRecorder {
    process: Child,
    output: PathBuf,
}

impl VideoRecorder {
    pub fn start(directory: &Path) -> FlightResult<Self> {
        let output = directory.join(format!("qcvid_{}.h264", get_unix_time_seconds()));
        let mut command = Command::new("raspivid");
        command
            .args(["-rot", "180", "-w", "1280", "-h", "720", "-o"])
            .arg(&output)
            .args(["-n", "-t", "0", "-fps", "30", "-b", "5000000"]);
        Self::spawn(command, output)
    }

    fn spawn(mut command: Command, output: PathBuf) -> FlightResult<Self> {
        let process = command
            .process_group(0)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()?;
        log::info!("Recording video to {}", output.display());
        Ok(VideoRecorder { process, output })
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Sends SIGINT so the recorder closes the file cleanly, then reaps it.
    /// If the signal cannot be delivered the recorder is killed outright and
    /// the delivery failure is returned.
    pub fn stop(mut self) -> FlightResult<()> {
        let pid = self.process.id() as libc::pid_t;
        // SAFETY: pid is our own child and has not been reaped yet.
        if unsafe { libc::kill(pid, libc::SIGINT) } != 0 {
            let error = io::Error::last_os_error();
            self.process.kill()?;
            self.process.wait()?;
            return Err(error.into());
        }
        self.process.wait()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_interrupts_the_recorder() {
        let mut command = Command::new("sleep");
        command.arg("30");
        let recorder = VideoRecorder::spawn(command, PathBuf::from("/tmp/none.h264")).unwrap();
        assert_eq!(recorder.output(), Path::new("/tmp/none.h264"));
        recorder.stop().unwrap();
    }

    #[test]
    fn stop_reaps_a_recorder_that_exits_on_sigint() {
        let mut command = Command::new("sh");
        command.args(["-c", "trap 'exit 0' INT; sleep 30 & wait"]);
        let recorder = VideoRecorder::spawn(command, PathBuf::from("/tmp/none.h264")).unwrap();
        let started = std::time::Instant::now();
        recorder.stop().unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }
}
