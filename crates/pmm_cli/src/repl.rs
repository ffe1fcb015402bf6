//! REPL command parsing.

use pmm_core::{EmotionComponent, Mode};
use pmm_memory::MAX_STEP_BATCH;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Step(usize),
    Run,
    Pause,
    Stress,
    Mode(Mode),
    Flush(Vec<usize>),
    Compress,
    Expand,
    Say(String),
    Emotion(EmotionComponent, f32),
    Decode(usize),
    Status,
    Slots,
    Logs,
    Chat,
    Dump,
    Reset,
    Load(PathBuf),
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  step [n]                 advance n ticks (default 1, max 10000)
  run | pause              start or stop the heartbeat
  stress                   toggle the stress test
  mode <inference|training>  switch mode (pauses)
  flush <slot>...          zero slots (decimal or 0x hex)
  compress                 flush every idle slot
  expand                   force a capacity doubling
  say <text>               talk to the cortex
  emotion <v|a|d> <value>  override one emotion axis
  decode <slot>            inspect a memory slot
  status | slots | logs | chat
  dump                     print the snapshot as JSON
  reset                    reinitialize from the current config
  load <file.toml>         apply a new brain config (restarts the run)
  quit";

impl FromStr for ReplCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match head.to_ascii_lowercase().as_str() {
            "step" | "s" => match args.first() {
                Some(n) => {
                    let count: usize = n
                        .parse()
                        .map_err(|_| format!("step count must be a number, got '{n}'"))?;
                    if !(1..=MAX_STEP_BATCH).contains(&count) {
                        return Err(format!("step count must be between 1 and {MAX_STEP_BATCH}"));
                    }
                    Self::Step(count)
                }
                None => Self::Step(1),
            },
            "run" | "start" => Self::Run,
            "pause" | "stop" => Self::Pause,
            "stress" => Self::Stress,
            "mode" => {
                let m = args.first().ok_or("usage: mode <inference|training>")?;
                Self::Mode(m.parse()?)
            }
            "flush" => {
                if args.is_empty() {
                    return Err("usage: flush <slot>...".to_string());
                }
                Self::Flush(args.iter().map(|a| parse_slot(a)).collect::<Result<_, _>>()?)
            }
            "compress" | "optimize" => Self::Compress,
            "expand" => Self::Expand,
            "say" => {
                if rest.is_empty() {
                    return Err("usage: say <text>".to_string());
                }
                Self::Say(rest.to_string())
            }
            "emotion" => match args.as_slice() {
                [component, value] => {
                    let value: f32 = value
                        .parse()
                        .map_err(|_| format!("emotion value must be a number, got '{value}'"))?;
                    Self::Emotion(component.parse()?, value)
                }
                _ => return Err("usage: emotion <valence|arousal|dominance> <value>".to_string()),
            },
            "decode" => {
                let slot = args.first().ok_or("usage: decode <slot>")?;
                Self::Decode(parse_slot(slot)?)
            }
            "status" => Self::Status,
            "slots" | "grid" => Self::Slots,
            "logs" => Self::Logs,
            "chat" => Self::Chat,
            "dump" => Self::Dump,
            "reset" => Self::Reset,
            "load" => {
                if rest.is_empty() {
                    return Err("usage: load <file.toml>".to_string());
                }
                Self::Load(PathBuf::from(rest))
            }
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(format!("unknown command '{other}', try 'help'")),
        };
        Ok(command)
    }
}

/// Slot index in decimal or `0x`-prefixed hex, matching the log format.
fn parse_slot(s: &str) -> Result<usize, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| format!("invalid slot index '{s}'"))
}
