use anyhow::{Context, Result};
use std::process::{Child, Command, Stdio};

/// Something that can read a pet line out loud.
pub(crate) trait Speaker {
    fn speak(&mut self, text: &str) -> Result<()>;
}

/// Muted output.
#[derive(Debug, Default)]
pub(crate) struct Silent;

impl Speaker for Silent {
    fn speak(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Runs an external TTS program with the line as its final argument.
/// The previous utterance is stopped when a new one starts.
#[derive(Debug)]
pub(crate) struct CommandSpeaker {
    program: String,
    args: Vec<String>,
    current: Option<Child>,
}

impl CommandSpeaker {
    /// Splits `command` on whitespace into program and leading arguments.
    pub(crate) fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            current: None,
        })
    }

    fn stop_current(&mut self) {
        if let Some(mut child) = self.current.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&mut self, text: &str) -> Result<()> {
        self.stop_current();
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to start speech command `{}`", self.program))?;
        self.current = Some(child);
        Ok(())
    }
}

impl Drop for CommandSpeaker {
    fn drop(&mut self) {
        self.stop_current();
    }
}

/// Picks the speaker for the current settings.
pub(crate) fn speaker_for(muted: bool, command: Option<&str>) -> Box<dyn Speaker> {
    if muted {
        return Box::new(Silent);
    }
    match command.and_then(CommandSpeaker::parse) {
        Some(s) => Box::new(s),
        None => Box::new(Silent),
    }
}

/// Speech never interrupts the conversation.
pub(crate) fn speak_best_effort(speaker: &mut dyn Speaker, text: &str) {
    if let Err(e) = speaker.speak(text) {
        tracing::warn!(error = %e, "speech failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Vec<String>);

    impl Speaker for Recorder {
        fn speak(&mut self, text: &str) -> Result<()> {
            if text.is_empty() {
                anyhow::bail!("nothing to say");
            }
            self.0.push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn parse_splits_program_and_args() {
        let s = CommandSpeaker::parse("espeak -s 150").unwrap();
        assert_eq!(s.program, "espeak");
        assert_eq!(s.args, vec!["-s", "150"]);
        assert!(CommandSpeaker::parse("   ").is_none());
    }

    #[test]
    fn failures_are_swallowed() {
        let mut r = Recorder(Vec::new());
        speak_best_effort(&mut r, "");
        speak_best_effort(&mut r, "Woof!");
        assert_eq!(r.0, vec!["Woof!"]);
    }

    #[test]
    fn missing_program_reports_error() {
        let mut s = CommandSpeaker::parse("definitely-not-a-real-tts-binary-xyz").unwrap();
        assert!(s.speak("hello").is_err());
        speak_best_effort(&mut s, "hello");
    }

    #[test]
    fn muted_always_wins() {
        let mut s = speaker_for(true, Some("espeak"));
        assert!(s.speak("hi").is_ok());
    }
}
