use std::io::{self, Write};
use std::sync::Arc;

use log::{debug, trace};
use tonegen_core::{CONTROLS_HELP, ControlEvent, ControlState, Outcome};

use crate::keyboard::KeySource;

/// Why the control loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The user pressed the quit key.
    UserQuit,
    /// Something else cleared the running flag.
    Stopped,
}

/// Turns key presses into control-state updates and echoes a status line.
pub struct ControlSurface<K, W> {
    keys: K,
    out: W,
    controls: Arc<ControlState>,
}

impl<K: KeySource, W: Write> ControlSurface<K, W> {
    pub fn new(keys: K, out: W, controls: Arc<ControlState>) -> Self {
        Self { keys, out, controls }
    }

    /// Run until quit or until the controls are stopped elsewhere.
    pub fn run(&mut self) -> io::Result<Exit> {
        self.write_help()?;

        while self.controls.is_running() {
            let Some(key) = self.keys.next_key()? else {
                continue;
            };
            let Some(event) = ControlEvent::from_key(key) else {
                trace!("ignoring key {:?}", key);
                continue;
            };

            debug!("control event {:?}", event);
            if event.apply(&self.controls) == Outcome::Quit {
                // leave the status line intact
                write!(self.out, "\r\n")?;
                self.out.flush()?;
                return Ok(Exit::UserQuit);
            }
            self.write_status()?;
        }

        Ok(Exit::Stopped)
    }

    fn write_help(&mut self) -> io::Result<()> {
        // Raw mode does not translate "\n", so every line needs its own "\r".
        write!(self.out, "\r\n")?;
        for line in CONTROLS_HELP.lines() {
            write!(self.out, "{}\r\n", line)?;
        }
        self.out.flush()
    }

    fn write_status(&mut self) -> io::Result<()> {
        write!(self.out, "\r{}    ", self.controls.snapshot())?;
        self.out.flush()
    }
}
