#[cfg(feature = "audio")]
use rodio::{source::SineWave, OutputStream, Sink, Source};

#[cfg(feature = "audio")]
const DEFAULT_FREQUENCY: f32 = 440.0;

/// Plays a tone while the sound timer runs.
#[cfg(feature = "audio")]
pub struct Beep {
    sink: Sink,
    #[allow(dead_code)]
    stream: OutputStream,
}

#[cfg(feature = "audio")]
impl Beep {
    pub fn new() -> anyhow::Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&stream_handle)?;
        let source = SineWave::new(DEFAULT_FREQUENCY).repeat_infinite();

        sink.append(source);
        sink.pause();

        Ok(Self { sink, stream })
    }

    pub fn set_active(&mut self, active: bool) {
        if active {
            self.sink.play();
        } else {
            self.sink.pause();
        }
    }
}

/// Rings the terminal bell each time the sound timer starts.
#[cfg(not(feature = "audio"))]
pub struct Beep {
    active: bool,
}

#[cfg(not(feature = "audio"))]
impl Beep {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self { active: false })
    }

    pub fn set_active(&mut self, active: bool) {
        use std::io::Write;

        if active && !self.active {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(b"\x07").and_then(|()| stdout.flush());
        }
        self.active = active;
    }
}
