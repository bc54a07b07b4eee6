//! Interactive dream session on a line-based terminal.
//!
//! The loop reads one command per line, runs it against the [`App`] and
//! keeps all state in a [`Session`]. Errors never end the session; they are
//! reported and the next command is read. End of input quits.

use crate::app::App;
use crate::models::{DreamSubmission, Emotion, EmotionIntensity, InterpretationStyle};
use crate::present;
use crate::progress::Progress;
use crate::session::Session;
use crate::share::ShareLinks;
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::{debug, warn};

pub const INTERPRETATION_UNREADABLE: &str =
    "The interpretation could not be read. Please try again.";

const HELP: &str = "\
Commands:
  new        describe a new dream and generate three images
  select N   pick image N and get a reading
  save N     save image N as a PNG file
  history    list the readings of this session
  help       show this list
  quit       leave the session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    New,
    Select(usize),
    Save(usize),
    History,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        match (name.as_str(), arg) {
            ("new", None) => Ok(Command::New),
            ("select", Some(n)) => Ok(Command::Select(image_number(n)?)),
            ("save", Some(n)) => Ok(Command::Save(image_number(n)?)),
            ("history", None) => Ok(Command::History),
            ("help", None) => Ok(Command::Help),
            ("quit" | "exit", None) => Ok(Command::Quit),
            ("select" | "save", None) => Err(Error::InvalidInput(format!(
                "'{}' needs an image number",
                name
            ))),
            _ => Err(Error::InvalidInput(format!(
                "Unknown command '{}'. Type 'help' for the list",
                line.trim()
            ))),
        }
    }
}

/// Parse a 1-based image number into a zero-based index.
fn image_number(raw: &str) -> Result<usize> {
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(Error::InvalidInput(format!(
            "'{}' is not an image number",
            raw
        ))),
    }
}

enum Flow {
    Continue,
    Quit,
}

pub struct Repl<'a, R: BufRead, W: Write> {
    app: &'a App,
    session: Session,
    input: R,
    output: W,
    show_progress: bool,
}

impl<'a, R: BufRead, W: Write> Repl<'a, R, W> {
    pub fn new(app: &'a App, input: R, output: W) -> Self {
        Self {
            app,
            session: Session::new(),
            input,
            output,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Read and run commands until `quit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        writeln!(
            self.output,
            "Dream oracle. Type 'new' to describe a dream, 'help' for commands."
        )?;

        loop {
            let Some(line) = self.ask("> ")? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let outcome = match line.parse::<Command>() {
                Ok(command) => self.execute(command).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(Error::Io(e)) => return Err(Error::Io(e)),
                Err(e) => writeln!(self.output, "Error: {}", e)?,
            }
        }

        writeln!(self.output, "Goodbye.")?;
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> Result<Flow> {
        debug!("Session {}: {:?}", self.session.id(), command);
        match command {
            Command::New => self.new_dream().await?,
            Command::Select(index) => self.select(index).await?,
            Command::Save(index) => self.save(index).await?,
            Command::History => {
                let text = present::render_history(self.session.history());
                write!(self.output, "{}", text)?;
            }
            Command::Help => writeln!(self.output, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn new_dream(&mut self) -> Result<()> {
        let submission = self.collect_submission()?;

        let spinner = self.spinner("Writing image prompts");
        let prompts = self.app.synthesize_prompts(submission.narrative()).await;
        spinner.finish_clear();
        let prompts = prompts?;

        let bar = self.bar(prompts.len(), "Generating images");
        let images = self.app.generate_images(&prompts, &bar).await;
        bar.finish_clear();
        let images = images?;

        self.session.begin_generation(submission, images)?;
        write!(
            self.output,
            "{}",
            present::render_images(self.session.current_images())
        )?;
        writeln!(self.output, "Use 'select N' to get a reading.")?;
        Ok(())
    }

    async fn select(&mut self, index: usize) -> Result<()> {
        let image = self.session.select_image(index)?.clone();
        let submission = self
            .session
            .current_submission()
            .cloned()
            .ok_or(Error::NoSelection)?;

        let spinner = self.spinner("Reading your dream");
        let interpretation = self.app.interpret(&submission).await;
        spinner.finish_clear();

        let interpretation = match interpretation {
            Ok(interpretation) => interpretation,
            Err(Error::MalformedResponse(detail)) => {
                warn!("Unreadable interpretation: {}", detail);
                writeln!(self.output, "{}", INTERPRETATION_UNREADABLE)?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.session.record_interpretation(&interpretation)?;
        write!(
            self.output,
            "{}",
            present::render_interpretation(&submission, &image, &interpretation)
        )?;
        write!(
            self.output,
            "{}",
            present::render_share_links(&ShareLinks::build(&image, &interpretation))
        )?;
        Ok(())
    }

    async fn save(&mut self, index: usize) -> Result<()> {
        let images = self.session.current_images();
        let image = images
            .get(index)
            .cloned()
            .ok_or_else(|| Error::bad_selection(index, images.len()))?;

        let path = self
            .app
            .download(&image, &format!("dream_image_{}", index + 1))
            .await?;
        writeln!(self.output, "Saved to {}", path.display())?;
        Ok(())
    }

    fn collect_submission(&mut self) -> Result<DreamSubmission> {
        writeln!(
            self.output,
            "Describe your dream. Finish with an empty line."
        )?;
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            if line.trim().is_empty() {
                break;
            }
            lines.push(line);
        }
        let narrative = lines.join("\n");
        if narrative.trim().is_empty() {
            return Err(Error::InvalidInput(
                "The dream description is empty".to_string(),
            ));
        }

        let emotions = self.ask_emotions()?;
        let intensity = if emotions.is_empty() {
            EmotionIntensity::default()
        } else {
            self.ask_intensity()?
        };
        let notes = self
            .ask("Anything else about how it felt? (optional): ")?
            .unwrap_or_default();
        let style = self.ask_style()?;

        Ok(DreamSubmission::new(narrative, style)?
            .with_emotions(emotions)
            .with_intensity(intensity)
            .with_notes(notes))
    }

    fn ask_emotions(&mut self) -> Result<BTreeSet<Emotion>> {
        let options = Emotion::ALL
            .iter()
            .map(Emotion::label)
            .collect::<Vec<_>>()
            .join(", ");
        let question = format!(
            "Primary emotions, comma separated ({}), blank for none: ",
            options
        );

        loop {
            let Some(answer) = self.ask(&question)? else {
                return Ok(BTreeSet::new());
            };
            match Emotion::parse_list(&answer) {
                Ok(emotions) => return Ok(emotions),
                Err(e) => writeln!(self.output, "Error: {}", e)?,
            }
        }
    }

    fn ask_intensity(&mut self) -> Result<EmotionIntensity> {
        loop {
            let Some(answer) = self.ask("Intensity 1-10 [5]: ")? else {
                return Ok(EmotionIntensity::default());
            };
            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(EmotionIntensity::default());
            }

            let parsed = answer
                .parse::<u8>()
                .map_err(|_| Error::InvalidInput(format!("'{}' is not a number", answer)))
                .and_then(EmotionIntensity::new);
            match parsed {
                Ok(intensity) => return Ok(intensity),
                Err(e) => writeln!(self.output, "Error: {}", e)?,
            }
        }
    }

    fn ask_style(&mut self) -> Result<InterpretationStyle> {
        loop {
            let Some(answer) = self.ask("Style, spiritual or psychological [psychological]: ")?
            else {
                return Ok(InterpretationStyle::default());
            };
            if answer.trim().is_empty() {
                return Ok(InterpretationStyle::default());
            }
            match answer.parse::<InterpretationStyle>() {
                Ok(style) => return Ok(style),
                Err(e) => writeln!(self.output, "Error: {}", e)?,
            }
        }
    }

    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;
        self.read_line()
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn spinner(&self, message: &str) -> Progress {
        if self.show_progress {
            Progress::spinner(message)
        } else {
            Progress::hidden()
        }
    }

    fn bar(&self, total: usize, message: &str) -> Progress {
        if self.show_progress {
            Progress::bar(total as u64, message)
        } else {
            Progress::hidden()
        }
    }
}
