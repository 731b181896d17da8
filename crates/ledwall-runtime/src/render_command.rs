#![forbid(unsafe_code)]

//! Renderer command stream.
//!
//! The renderer process polls a plain-text command file (default
//! [`DEFAULT_COMMAND_FILE`]); each line is one command:
//!
//! ```text
//! add image <id> <filepath> <x> <y>
//! move <id> <x> <y>
//! remove <id>
//! scale <id> <scale>
//! set_text <id> <text...>
//! set_font_size <id> <size>
//! set_font <id> <font_path>
//! set_font_color <id> <b> <g> <r>
//! pause
//! resume
//! quit
//! ```
//!
//! `<id>` is the renderer's own handle for an element, fixed when the
//! element is added and independent of its layer (see [`RendererIds`]).
//! Coordinates are wall-space. The renderer rejects negative `move`
//! coordinates, so parsing does too. [`RenderCommand`] encodes with
//! `Display` and decodes with `FromStr`.

use std::collections::HashMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use ledwall_core::geometry::WallPoint;
use ledwall_layers::{Element, ElementKey, ElementKind, LayerStack};

/// Command file polled by the renderer.
pub const DEFAULT_COMMAND_FILE: &str = "/tmp/led-cmd";

/// One renderer command.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    AddImage {
        id: u32,
        filepath: String,
        x: i32,
        y: i32,
    },
    Move {
        id: u32,
        x: i32,
        y: i32,
    },
    Remove {
        id: u32,
    },
    Scale {
        id: u32,
        scale: f64,
    },
    SetText {
        id: u32,
        text: String,
    },
    SetFontSize {
        id: u32,
        size: f64,
    },
    SetFont {
        id: u32,
        font_path: String,
    },
    /// Colour channels in the renderer's BGR order.
    SetFontColor {
        id: u32,
        b: u8,
        g: u8,
        r: u8,
    },
    Pause,
    Resume,
    Quit,
}

impl RenderCommand {
    /// Commands that place `element` on the renderer as `id` at `wall`.
    #[must_use]
    pub fn place(id: u32, element: &Element, wall: WallPoint) -> Vec<Self> {
        match &element.kind {
            ElementKind::Image { filepath, scale } => {
                let mut cmds = vec![Self::AddImage {
                    id,
                    filepath: filepath.clone(),
                    x: wall.x,
                    y: wall.y,
                }];
                if *scale != 1.0 {
                    cmds.push(Self::Scale { id, scale: *scale });
                }
                cmds
            }
            ElementKind::Text {
                content,
                size,
                color,
                font_path,
            } => {
                let mut cmds = vec![
                    Self::SetText {
                        id,
                        text: content.clone(),
                    },
                    Self::SetFont {
                        id,
                        font_path: font_path.clone(),
                    },
                    Self::SetFontSize { id, size: *size },
                ];
                if let Some((r, g, b)) = parse_hex_color(color) {
                    cmds.push(Self::SetFontColor { id, b, g, r });
                }
                if let Some(mv) = Self::move_to(id, wall) {
                    cmds.push(mv);
                }
                cmds
            }
        }
    }

    /// `move`, unless the position is off the renderer's canvas.
    #[must_use]
    pub fn move_to(id: u32, wall: WallPoint) -> Option<Self> {
        (wall.x >= 0 && wall.y >= 0).then_some(Self::Move {
            id,
            x: wall.x,
            y: wall.y,
        })
    }

    /// Command keyword.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::AddImage { .. } => "add",
            Self::Move { .. } => "move",
            Self::Remove { .. } => "remove",
            Self::Scale { .. } => "scale",
            Self::SetText { .. } => "set_text",
            Self::SetFontSize { .. } => "set_font_size",
            Self::SetFont { .. } => "set_font",
            Self::SetFontColor { .. } => "set_font_color",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Quit => "quit",
        }
    }
}

impl fmt::Display for RenderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddImage { id, filepath, x, y } => {
                write!(f, "add image {id} {filepath} {x} {y}")
            }
            Self::Move { id, x, y } => write!(f, "move {id} {x} {y}"),
            Self::Remove { id } => write!(f, "remove {id}"),
            Self::Scale { id, scale } => write!(f, "scale {id} {scale}"),
            // One command per line: embedded newlines would split it.
            Self::SetText { id, text } => write!(f, "set_text {id} {}", text.replace(['\n', '\r'], " ")),
            Self::SetFontSize { id, size } => write!(f, "set_font_size {id} {size}"),
            Self::SetFont { id, font_path } => write!(f, "set_font {id} {font_path}"),
            Self::SetFontColor { id, b, g, r } => write!(f, "set_font_color {id} {b} {g} {r}"),
            Self::Pause => f.write_str("pause"),
            Self::Resume => f.write_str("resume"),
            Self::Quit => f.write_str("quit"),
        }
    }
}

/// Why a command line failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCommandParseError {
    Empty,
    UnknownCommand(String),
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    InvalidNumber {
        command: &'static str,
        value: String,
    },
    /// `move` with a negative coordinate.
    NegativeCoordinate { x: i32, y: i32 },
    TrailingInput {
        command: &'static str,
        rest: String,
    },
}

impl fmt::Display for RenderCommandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::UnknownCommand(word) => write!(f, "unknown command {word:?}"),
            Self::MissingArgument { command, argument } => {
                write!(f, "{command}: missing <{argument}>")
            }
            Self::InvalidNumber { command, value } => {
                write!(f, "{command}: {value:?} is not a valid number")
            }
            Self::NegativeCoordinate { x, y } => {
                write!(f, "move: coordinates ({x}, {y}) must not be negative")
            }
            Self::TrailingInput { command, rest } => {
                write!(f, "{command}: unexpected trailing input {rest:?}")
            }
        }
    }
}

impl std::error::Error for RenderCommandParseError {}

/// Whitespace tokenizer that can hand back the unparsed remainder.
struct Args<'a> {
    command: &'static str,
    rest: &'a str,
}

impl<'a> Args<'a> {
    fn next(&mut self, argument: &'static str) -> Result<&'a str, RenderCommandParseError> {
        let rest = self.rest.trim_start();
        if rest.is_empty() {
            return Err(RenderCommandParseError::MissingArgument {
                command: self.command,
                argument,
            });
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        self.rest = &rest[end..];
        Ok(&rest[..end])
    }

    fn number<T: FromStr>(&mut self, argument: &'static str) -> Result<T, RenderCommandParseError> {
        let token = self.next(argument)?;
        token
            .parse()
            .map_err(|_| RenderCommandParseError::InvalidNumber {
                command: self.command,
                value: token.to_string(),
            })
    }

    /// Everything left, which must be non-empty.
    fn remainder(&mut self, argument: &'static str) -> Result<&'a str, RenderCommandParseError> {
        let rest = self.rest.trim();
        if rest.is_empty() {
            return Err(RenderCommandParseError::MissingArgument {
                command: self.command,
                argument,
            });
        }
        self.rest = "";
        Ok(rest)
    }

    fn finish(self) -> Result<(), RenderCommandParseError> {
        let rest = self.rest.trim();
        if rest.is_empty() {
            Ok(())
        } else {
            Err(RenderCommandParseError::TrailingInput {
                command: self.command,
                rest: rest.to_string(),
            })
        }
    }
}

impl FromStr for RenderCommand {
    type Err = RenderCommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        if word.is_empty() {
            return Err(RenderCommandParseError::Empty);
        }

        let keyword = match word {
            "add" => "add",
            "move" => "move",
            "remove" => "remove",
            "scale" => "scale",
            "set_text" => "set_text",
            "set_font_size" => "set_font_size",
            "set_font" => "set_font",
            "set_font_color" => "set_font_color",
            "pause" => "pause",
            "resume" => "resume",
            "quit" => "quit",
            other => return Err(RenderCommandParseError::UnknownCommand(other.to_string())),
        };
        let mut args = Args {
            command: keyword,
            rest,
        };

        let cmd = match keyword {
            "add" => {
                let kind = args.next("kind")?;
                if kind != "image" {
                    return Err(RenderCommandParseError::UnknownCommand(format!("add {kind}")));
                }
                let id = args.number("id")?;
                // The filepath may contain spaces; x and y are the last two tokens.
                let body = args.remainder("filepath")?;
                let mut tail = body.rsplitn(3, char::is_whitespace);
                let y_token = tail.next().unwrap_or_default();
                let x_token = tail.next();
                let filepath = tail.next().map(str::trim_end);
                let (Some(x_token), Some(filepath)) = (x_token, filepath) else {
                    return Err(RenderCommandParseError::MissingArgument {
                        command: keyword,
                        argument: "y",
                    });
                };
                let parse = |v: &str| {
                    v.parse::<i32>()
                        .map_err(|_| RenderCommandParseError::InvalidNumber {
                            command: keyword,
                            value: v.to_string(),
                        })
                };
                Self::AddImage {
                    id,
                    filepath: filepath.to_string(),
                    x: parse(x_token)?,
                    y: parse(y_token)?,
                }
            }
            "move" => {
                let id = args.number("id")?;
                let x = args.number("x")?;
                let y = args.number("y")?;
                if x < 0 || y < 0 {
                    return Err(RenderCommandParseError::NegativeCoordinate { x, y });
                }
                Self::Move { id, x, y }
            }
            "remove" => Self::Remove {
                id: args.number("id")?,
            },
            "scale" => Self::Scale {
                id: args.number("id")?,
                scale: args.number("scale")?,
            },
            "set_text" => Self::SetText {
                id: args.number("id")?,
                text: args.remainder("text")?.to_string(),
            },
            "set_font_size" => Self::SetFontSize {
                id: args.number("id")?,
                size: args.number("size")?,
            },
            "set_font" => Self::SetFont {
                id: args.number("id")?,
                font_path: args.remainder("font_path")?.to_string(),
            },
            "set_font_color" => Self::SetFontColor {
                id: args.number("id")?,
                b: args.number("b")?,
                g: args.number("g")?,
                r: args.number("r")?,
            },
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            _ => Self::Quit,
        };
        args.finish()?;
        Ok(cmd)
    }
}

/// Parse `#rrggbb` or `#rrggbbaa` into `(r, g, b)`. Alpha is ignored.
#[must_use]
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer ids
// ─────────────────────────────────────────────────────────────────────────────

/// Renderer handles for the elements of a stack.
///
/// A handle is assigned once per element and never reused, so reordering
/// or removing layers does not change which renderer object a command
/// addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RendererIds {
    ids: HashMap<ElementKey, u32>,
    next: u32,
}

impl RendererIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles for a freshly loaded stack: each element keeps its layer id,
    /// which is how a full placement numbers them.
    #[must_use]
    pub fn from_stack(stack: &LayerStack) -> Self {
        let ids: HashMap<ElementKey, u32> =
            stack.iter().map(|e| (e.key(), e.id().get())).collect();
        let next = ids.values().copied().max().unwrap_or(0);
        Self { ids, next }
    }

    /// Handle for `key`, assigning the next unused one on first use.
    pub fn assign(&mut self, key: ElementKey) -> u32 {
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        self.next += 1;
        self.ids.insert(key, self.next);
        self.next
    }

    #[must_use]
    pub fn get(&self, key: ElementKey) -> Option<u32> {
        self.ids.get(&key).copied()
    }

    /// Forget `key`. Its handle is not handed out again.
    pub fn release(&mut self, key: ElementKey) -> Option<u32> {
        self.ids.remove(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sinks
// ─────────────────────────────────────────────────────────────────────────────

/// Destination for renderer commands.
pub trait CommandSink: Send + Sync {
    fn send(&self, command: &RenderCommand) -> io::Result<()>;

    /// Send several commands; stops at the first failure.
    fn send_all(&self, commands: &[RenderCommand]) -> io::Result<()> {
        for command in commands {
            self.send(command)?;
        }
        Ok(())
    }
}

/// Appends commands to the renderer's command file.
#[derive(Debug, Clone)]
pub struct FileCommandSink {
    path: PathBuf,
}

impl FileCommandSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileCommandSink {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_FILE)
    }
}

impl CommandSink for FileCommandSink {
    fn send(&self, command: &RenderCommand) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{command}")
    }
}

/// Collects commands in memory.
#[derive(Debug, Default)]
pub struct MemoryCommandSink {
    commands: Mutex<Vec<RenderCommand>>,
}

impl MemoryCommandSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far.
    #[must_use]
    pub fn commands(&self) -> Vec<RenderCommand> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

impl CommandSink for MemoryCommandSink {
    fn send(&self, command: &RenderCommand) -> io::Result<()> {
        self.commands
            .lock()
            .map_err(|_| io::Error::other("command sink lock poisoned"))?
            .push(command.clone());
        Ok(())
    }
}
