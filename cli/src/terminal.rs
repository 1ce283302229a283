//! Line-oriented terminal front-end.
//!
//! Renders [`FlowUpdate`]s as text and turns typed answers into
//! [`FlowCommand`]s. Generic over its input and output so it can be driven
//! from tests.

use anyhow::{bail, Context, Result};
use bucketdrop_flow::{FlowCommand, FlowHandle, FlowUpdate, Notification};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

/// What the user asked the binary to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Goal {
    /// Upload the shared file, into `bucket` when given, otherwise into the
    /// bucket the user picks.
    Upload { bucket: Option<String> },
    /// Pick (and remember) a bucket without uploading anything.
    PickBucket,
    SignOut,
}

/// An answer to the bucket prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketChoice {
    Bucket(String),
    Quit,
    Invalid,
}

/// Interprets a line typed at the bucket prompt.
///
/// Accepts a 1-based number, an exact bucket name, an empty line (keep the
/// highlighted entry) or `q`.
pub fn parse_bucket_choice(line: &str, items: &[String], selected: Option<usize>) -> BucketChoice {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return BucketChoice::Quit;
    }
    if line.is_empty() {
        return match selected.and_then(|i| items.get(i)) {
            Some(name) => BucketChoice::Bucket(name.clone()),
            None => BucketChoice::Invalid,
        };
    }
    if let Ok(n) = line.parse::<usize>() {
        return match n.checked_sub(1).and_then(|i| items.get(i)) {
            Some(name) => BucketChoice::Bucket(name.clone()),
            None => BucketChoice::Invalid,
        };
    }
    match items.iter().find(|item| item.as_str() == line) {
        Some(name) => BucketChoice::Bucket(name.clone()),
        None => BucketChoice::Invalid,
    }
}

/// Drives one flow session from a terminal.
pub struct Terminal<R, W> {
    input: Lines<R>,
    out: W,
    goal: Goal,
    /// Items of the last selector we answered, to recognise its echo.
    answered: Option<Vec<String>>,
    /// The flow uploads into the restored bucket by itself.
    upload_on_restore: bool,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, out: W, goal: Goal) -> Self {
        Self {
            input: input.lines(),
            out,
            goal,
            answered: None,
            upload_on_restore: false,
        }
    }

    /// Skips the bucket prompt when the flow uploads on restore.
    pub fn upload_on_restore(mut self, enabled: bool) -> Self {
        self.upload_on_restore = enabled;
        self
    }

    /// Consumes the terminal, returning its output.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Handles updates until the goal is reached or abandoned.
    pub async fn run(
        &mut self,
        handle: &FlowHandle,
        updates: &mut UnboundedReceiver<FlowUpdate>,
    ) -> Result<()> {
        while let Some(update) = updates.recv().await {
            debug!("Update: {:?}", update);
            match update {
                FlowUpdate::SignInRequired { url } => self.sign_in(handle, &url).await?,
                FlowUpdate::SelectorChanged { items, selected } => {
                    if self.selector_changed(handle, items, selected).await? {
                        return Ok(());
                    }
                }
                FlowUpdate::Notification(notification) => {
                    if notification.is_error() {
                        bail!("{notification}");
                    }
                    writeln!(self.out, "{notification}")?;
                    if self.finished_by(&notification) {
                        return Ok(());
                    }
                }
                FlowUpdate::StateChanged(state) => debug!("Flow state: {:?}", state),
                FlowUpdate::Rejected(reason) => {
                    writeln!(self.out, "{reason}")?;
                    if matches!(self.goal, Goal::Upload { bucket: Some(_) }) {
                        bail!("{reason}");
                    }
                }
            }
        }
        bail!("upload flow stopped unexpectedly")
    }

    async fn sign_in(&mut self, handle: &FlowHandle, url: &str) -> Result<()> {
        writeln!(self.out, "Sign in with Google by opening:\n\n  {url}\n")?;
        write!(
            self.out,
            "Paste the authorization code or redirect URL (empty to cancel): "
        )?;
        self.out.flush()?;

        let line = self.read_line().await?.unwrap_or_default();
        let command = if line.trim().is_empty() {
            FlowCommand::CancelSignIn
        } else {
            FlowCommand::CompleteSignIn(line)
        };
        handle.send(command).await.context("upload flow stopped")
    }

    /// Returns true when the session is over.
    async fn selector_changed(
        &mut self,
        handle: &FlowHandle,
        items: Vec<String>,
        selected: Option<usize>,
    ) -> Result<bool> {
        if self.goal == Goal::SignOut {
            return Ok(false);
        }

        if self.answered.as_ref() == Some(&items) {
            // Echo of our own selection.
            if self.goal == Goal::PickBucket {
                if let Some(name) = selected.and_then(|i| items.get(i)) {
                    writeln!(self.out, "Selected {name}")?;
                }
                return Ok(true);
            }
            return Ok(false);
        }

        if items.is_empty() {
            if matches!(self.goal, Goal::Upload { .. }) {
                bail!("no buckets found in this project");
            }
            writeln!(self.out, "No buckets found in this project")?;
            return Ok(true);
        }

        if let Goal::Upload {
            bucket: Some(bucket),
        } = &self.goal
        {
            let bucket = bucket.clone();
            self.answered = Some(items);
            handle.select_bucket(bucket).await?;
            return Ok(false);
        }

        if self.upload_on_restore && self.goal == (Goal::Upload { bucket: None }) {
            if let Some(name) = selected.and_then(|i| items.get(i)) {
                writeln!(self.out, "Using {name}")?;
            }
            self.answered = Some(items);
            return Ok(false);
        }

        loop {
            self.print_selector(&items, selected)?;
            let Some(line) = self.read_line().await? else {
                return Ok(true);
            };
            match parse_bucket_choice(&line, &items, selected) {
                BucketChoice::Bucket(name) => {
                    self.answered = Some(items);
                    handle.select_bucket(name).await?;
                    return Ok(false);
                }
                BucketChoice::Quit => return Ok(true),
                BucketChoice::Invalid => writeln!(self.out, "No such bucket: {}", line.trim())?,
            }
        }
    }

    fn print_selector(&mut self, items: &[String], selected: Option<usize>) -> Result<()> {
        writeln!(self.out, "Buckets:")?;
        for (i, name) in items.iter().enumerate() {
            let marker = if Some(i) == selected { '*' } else { ' ' };
            writeln!(self.out, " {marker} {:>2}) {name}", i + 1)?;
        }
        write!(self.out, "Choose a bucket [Enter keeps *, q quits]: ")?;
        self.out.flush()?;
        Ok(())
    }

    /// Decides whether a successful `notification` ends the session.
    fn finished_by(&self, notification: &Notification) -> bool {
        match notification {
            Notification::UploadStarted { .. } | Notification::UploadCompleted { .. } => true,
            Notification::LoggedOut => self.goal == Goal::SignOut,
            _ => false,
        }
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        let line = self.input.next_line().await.context("failed to read input")?;
        Ok(line)
    }
}
