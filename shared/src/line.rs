//! Reassembly of CRLF-terminated protocol lines from arbitrary read chunks.
//!
//! A stream transport hands us bytes in whatever pieces the kernel chose, so a
//! single read may carry half a line, exactly one line, or several lines plus
//! the start of the next one. The reassembler keeps a bounded partial-line
//! buffer and a queue of completed lines:
//! - `feed` appends a chunk and yields the oldest completed line, if any
//! - `next_line` yields any further lines already completed by earlier chunks
//! - bytes after a terminator are never dropped, they start the next line
//!
//! The partial-line buffer never holds more than `capacity` bytes, terminator
//! included. A line that cannot fit is reported once as an `OverflowError`;
//! the rest of that oversized line is skipped up to its terminator so the
//! following line starts clean.

use std::collections::VecDeque;
use std::io;
use thiserror::Error;

/// Smallest buffer that can hold a one-byte line plus its terminator.
pub const MIN_CAPACITY: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("line exceeds the {capacity} byte input buffer")]
pub struct OverflowError {
    pub capacity: usize,
}

/// Result of handing one read to the reassembler.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A full line, terminator removed.
    Line(String),
    /// Bytes stored, no complete line yet.
    Pending,
    /// The peer closed its end (zero-length read).
    PeerClosed,
    /// The read itself failed.
    IoError(io::Error),
}

#[derive(Debug)]
enum Frame {
    Line(String),
    Overflow,
}

#[derive(Debug)]
pub struct LineReassembler {
    buf: Vec<u8>,
    capacity: usize,
    ready: VecDeque<Frame>,
    discarding: bool,
    saw_cr: bool,
}

impl LineReassembler {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            ready: VecDeque::new(),
            discarding: false,
            saw_cr: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes of the current, unterminated line.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Number of completed frames waiting for `next_line`.
    pub fn queued(&self) -> usize {
        self.ready.len()
    }

    /// Appends `bytes` and returns the oldest completed line.
    ///
    /// An empty chunk is a zero-length read and means the peer closed.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<ReadOutcome, OverflowError> {
        if bytes.is_empty() {
            return Ok(ReadOutcome::PeerClosed);
        }

        self.absorb(bytes);

        Ok(match self.next_line()? {
            Some(line) => ReadOutcome::Line(line),
            None => ReadOutcome::Pending,
        })
    }

    /// Same as `feed`, taking the raw result of a read call.
    pub fn feed_read(&mut self, read: io::Result<&[u8]>) -> Result<ReadOutcome, OverflowError> {
        match read {
            Ok(bytes) => self.feed(bytes),
            Err(err) => Ok(ReadOutcome::IoError(err)),
        }
    }

    /// Pops the next completed line left over from earlier chunks.
    pub fn next_line(&mut self) -> Result<Option<String>, OverflowError> {
        match self.ready.pop_front() {
            Some(Frame::Line(line)) => Ok(Some(line)),
            Some(Frame::Overflow) => Err(OverflowError {
                capacity: self.capacity,
            }),
            None => Ok(None),
        }
    }

    /// Drops the partial line and every queued line.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.ready.clear();
        self.discarding = false;
        self.saw_cr = false;
    }

    fn absorb(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.discarding {
                if self.saw_cr && byte == b'\n' {
                    self.discarding = false;
                }
                self.saw_cr = byte == b'\r';
                continue;
            }

            let terminates = byte == b'\n' && self.buf.last() == Some(&b'\r');

            if self.buf.len() == self.capacity {
                self.buf.clear();
                self.ready.push_back(Frame::Overflow);
                if !terminates {
                    self.discarding = true;
                    self.saw_cr = byte == b'\r';
                }
                continue;
            }

            self.buf.push(byte);

            if terminates {
                self.buf.truncate(self.buf.len() - 2);
                let line = String::from_utf8_lossy(&self.buf).into_owned();
                self.buf.clear();
                self.ready.push_back(Frame::Line(line));
            }
        }
    }
}
