//! Line-oriented session file.
//!
//! Sections, in order:
//!
//! 1. session name
//! 2. queue entry count, then one `noun:verb` line per entry
//! 3. asset entry count, then per entry its asset names and a blank line
//! 4. tracked variable count, then per variable its name, its index, its
//!    value history lines and a blank line
//! 5. `variable,length` change pairs, then a blank line
//! 6. `queue,assets,changes` snapshot triples (story start omitted), then a
//!    blank line
//! 7. bookmark queue index and description line pairs, then a blank line
//! 8. the end marker
//!
//! Loading places the session at its newest snapshot.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{SessionError, SessionResult};
use crate::history::History;
use crate::session::Session;
use crate::snapshot::Snapshot;

/// Last line of every session file.
pub const END_MARKER: &str = "END";

impl Session {
    /// Write the session in file layout.
    pub fn write_to(&self, out: &mut impl Write) -> SessionResult<()> {
        let history = self.history();
        writeln!(out, "{}", self.name())?;

        writeln!(out, "{}", history.queue().len())?;
        for entry in history.queue() {
            writeln!(out, "{entry}")?;
        }

        writeln!(out, "{}", history.asset_entries().len())?;
        for entry in history.asset_entries() {
            for name in entry {
                writeln!(out, "{name}")?;
            }
            writeln!(out)?;
        }

        writeln!(out, "{}", history.variables().len())?;
        for (index, name) in history.variables().iter().enumerate() {
            writeln!(out, "{name}")?;
            writeln!(out, "{index}")?;
            for value in history.variable_history(name).unwrap_or_default() {
                writeln!(out, "{value}")?;
            }
            writeln!(out)?;
        }

        for (variable, len) in history.changes() {
            writeln!(out, "{variable},{len}")?;
        }
        writeln!(out)?;

        for snapshot in self.snapshots().iter().skip(1) {
            writeln!(
                out,
                "{},{},{}",
                snapshot.queue, snapshot.assets, snapshot.changes
            )?;
        }
        writeln!(out)?;

        for (queue, description) in self.bookmarks() {
            writeln!(out, "{queue}")?;
            writeln!(out, "{description}")?;
        }
        writeln!(out)?;

        writeln!(out, "{END_MARKER}")?;
        Ok(())
    }

    /// Read a session written by [`Session::write_to`].
    pub fn read_from(input: impl BufRead) -> SessionResult<Session> {
        let mut reader = LineReader {
            lines: input.lines(),
            line: 0,
        };

        let name = reader.next("session name")?;

        let queue_len = reader.number("queue entry count")?;
        let queue = (0..queue_len)
            .map(|_| reader.next("queue entry"))
            .collect::<SessionResult<Vec<_>>>()?;

        let asset_len = reader.number("asset entry count")?;
        let assets = (0..asset_len)
            .map(|_| reader.until_blank("asset name"))
            .collect::<SessionResult<Vec<_>>>()?;

        let var_len = reader.number("tracked variable count")?;
        let mut variables = Vec::with_capacity(var_len);
        for expected in 0..var_len {
            let name = reader.next("variable name")?;
            let index = reader.number("variable index")?;
            if index != expected {
                return Err(reader.error(format!("expected variable index {expected}, found {index}")));
            }
            variables.push((name, reader.until_blank("variable value")?));
        }

        let mut changes = Vec::new();
        for line in reader.until_blank("change pair")? {
            let (variable, len) = reader.pair(&line)?;
            let valid = variables
                .get(variable)
                .is_some_and(|(_, values)| len >= 1 && len <= values.len());
            if !valid {
                return Err(reader.error(format!("change {line} points outside its history")));
            }
            changes.push((variable, len));
        }

        let mut snapshots = Vec::new();
        let mut previous = Snapshot::START;
        for line in reader.until_blank("snapshot")? {
            let mut fields = line.splitn(3, ',').map(|f| f.trim().parse::<usize>());
            let (Some(Ok(q)), Some(Ok(a)), Some(Ok(c))) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(reader.error(format!("expected `queue,assets,changes`, found {line:?}")));
            };
            let snapshot = Snapshot::new(q, a, c);
            if !snapshot.follows(&previous) || q > queue.len() || a > assets.len() || c > changes.len() {
                return Err(reader.error(format!("snapshot {line} is out of order or range")));
            }
            snapshots.push(snapshot);
            previous = snapshot;
        }

        let mut bookmarks = BTreeMap::new();
        loop {
            let index = reader.next("bookmark index")?;
            if index.is_empty() {
                break;
            }
            let queue_index = reader.parse_number(&index, "bookmark index")?;
            let description = reader.next("bookmark description")?;
            bookmarks.insert(queue_index, description);
        }

        let end = reader.next("end marker")?;
        if end != END_MARKER {
            return Err(reader.error(format!("expected {END_MARKER:?}, found {end:?}")));
        }

        let history = History::from_parts(queue, assets, variables, changes);
        let session = Session::from_parts(name, history, snapshots, bookmarks);
        tracing::debug!(
            name = session.name(),
            snapshots = session.snapshots().len() - 1,
            "session read"
        );
        Ok(session)
    }

    /// Write the session to a file.
    pub fn save(&self, path: &Path) -> SessionResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;
        tracing::info!(path = %path.display(), "session saved");
        Ok(())
    }

    /// Read a session from a file.
    pub fn load(path: &Path) -> SessionResult<Session> {
        let session = Self::read_from(BufReader::new(File::open(path)?))?;
        tracing::info!(path = %path.display(), "session loaded");
        Ok(session)
    }
}

struct LineReader<I> {
    lines: I,
    line: usize,
}

impl<I> LineReader<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    fn error(&self, message: impl Into<String>) -> SessionError {
        SessionError::Format {
            line: self.line,
            message: message.into(),
        }
    }

    fn next(&mut self, what: &str) -> SessionResult<String> {
        self.line += 1;
        match self.lines.next() {
            Some(Ok(line)) => Ok(line.trim_end_matches('\r').to_string()),
            Some(Err(e)) => Err(e.into()),
            None => Err(self.error(format!("unexpected end of file, expected {what}"))),
        }
    }

    fn parse_number(&self, text: &str, what: &str) -> SessionResult<usize> {
        text.trim()
            .parse()
            .map_err(|_| self.error(format!("expected {what}, found {text:?}")))
    }

    fn number(&mut self, what: &str) -> SessionResult<usize> {
        let line = self.next(what)?;
        self.parse_number(&line, what)
    }

    fn pair(&self, line: &str) -> SessionResult<(usize, usize)> {
        let (a, b) = line
            .split_once(',')
            .ok_or_else(|| self.error(format!("expected `a,b`, found {line:?}")))?;
        Ok((self.parse_number(a, "index")?, self.parse_number(b, "length")?))
    }

    fn until_blank(&mut self, what: &str) -> SessionResult<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let line = self.next(what)?;
            if line.is_empty() {
                return Ok(lines);
            }
            lines.push(line);
        }
    }
}
