//! REPL – drives a local session from the keyboard.
//!
//! Commands:
//!   w | forward        – step forward
//!   a | left           – turn left
//!   d | right          – turn right
//!   /tilt <x> <y> <z>  – feed one accelerometer sample
//!   /status            – every participant's view of the agent
//!   /map               – draw the maze
//!   /echo <text>       – send a debug echo
//!   /help              – show this list
//!   /quit | /exit      – leave

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mazelink_runtime::input::Acceleration;
use mazelink_runtime::{Participant, Session, TiltInput};
use mazelink_types::{
    DebugMessage, Direction, GridPosition, Intent, IntentPhase, MazeCell, MazeError, RejectReason,
    Rotation,
};

/// Local session plus the host-side frame settings.
pub struct Shell {
    session: Session,
    tilt: TiltInput,
    frame_dt: f32,
    max_frames: usize,
}

/// What the loop should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Continue,
    Quit,
}

impl Shell {
    pub fn new(session: Session, tilt: TiltInput, frame_dt: f32) -> Self {
        // One full step plus a second of slack.
        let travel = session.operator().travel_time();
        let max_frames = ((travel + 1.0) / frame_dt).ceil() as usize;
        Self {
            session,
            tilt,
            frame_dt,
            max_frames,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one command line.  Messages for the user are returned as lines.
    pub fn execute(&mut self, line: &str) -> Result<(Outcome, Vec<String>), MazeError> {
        let (cmd, rest) = match line.trim().split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line.trim(), ""),
        };
        let lines = match cmd {
            "w" | "forward" => self.step(Intent::Forward)?,
            "a" | "left" => self.step(Intent::Rotate {
                delta: Rotation::Left,
            })?,
            "d" | "right" => self.step(Intent::Rotate {
                delta: Rotation::Right,
            })?,
            "/tilt" => self.feed_tilt(rest)?,
            "/status" => self.status(),
            "/map" => render_map(&self.session).lines().map(str::to_string).collect(),
            "/echo" if !rest.is_empty() => {
                self.session.echo(DebugMessage::Text(rest.to_string()))?;
                self.session.pump()?;
                vec![format!("{} {}", "echoed".green(), rest)]
            }
            "/help" => help(),
            "/quit" | "/exit" => return Ok((Outcome::Quit, vec!["Goodbye.".green().to_string()])),
            other => vec![format!(
                "{} '{}'. Type {} for available commands.",
                "Unknown command:".red(),
                other.yellow(),
                "/help".bold()
            )],
        };
        Ok((Outcome::Continue, lines))
    }

    /// Finish any step still in flight so the next command starts idle.
    fn settle(&mut self) -> Result<usize, MazeError> {
        if self.session.is_settled() {
            return Ok(0);
        }
        self.session.run_until_idle(self.frame_dt, self.max_frames)
    }

    fn step(&mut self, intent: Intent) -> Result<Vec<String>, MazeError> {
        self.settle()?;
        let operator = self.session.operator();
        let sent = match intent {
            Intent::Forward => operator.request_forward(),
            Intent::Rotate { delta } => operator.request_rotate(delta),
        };
        match sent {
            Ok(()) => {}
            Err(MazeError::AgentBusy) => return Ok(vec!["agent is still moving".yellow().to_string()]),
            Err(e) => return Err(e),
        }

        let handled = self.session.pump()?;
        let frames = self.session.run_until_idle(self.frame_dt, self.max_frames)?;

        let mut lines: Vec<String> = handled.iter().map(|p| describe(p.intent, p.phase)).collect();
        if frames > 0 {
            lines.push(format!("  settled after {frames} frame(s)").dimmed().to_string());
        }
        lines.push(position_line(self.session.operator()));
        Ok(lines)
    }

    fn feed_tilt(&mut self, args: &str) -> Result<Vec<String>, MazeError> {
        let values: Vec<f32> = args
            .split_whitespace()
            .filter_map(|v| v.parse().ok())
            .collect();
        let &[x, y, z] = values.as_slice() else {
            return Ok(vec![format!("usage: {}", "/tilt <x> <y> <z>".bold())]);
        };
        let accel = Acceleration::new(x, y, z);
        self.settle()?;
        match self.tilt.sample(accel, self.session.operator().movement_state()) {
            Some(intent) => self.step(intent),
            None if self.tilt.is_centered() => Ok(vec!["  (centered)".dimmed().to_string()]),
            None => Ok(vec!["  (waiting for upright)".dimmed().to_string()]),
        }
    }

    fn status(&self) -> Vec<String> {
        let mut lines = vec![format!("{}", "Participants".bold().underline())];
        let relay = self.session.relay();
        lines.push(format!(
            "  {:<9} canonical {} facing {}",
            "authority".cyan(),
            relay.authority().position(),
            relay.authority().direction()
        ));
        let mirrors = std::iter::once(self.session.operator())
            .chain(std::iter::once(relay.participant()))
            .chain(self.session.observers());
        for p in mirrors {
            lines.push(format!(
                "  {:<9} {} facing {} {:?}",
                p.role().to_string().cyan(),
                p.position(),
                p.direction(),
                p.movement_state()
            ));
        }
        lines
    }
}

/// Read lines from stdin until EOF, `/quit` or `shutdown`.
pub fn run(mut shell: Shell, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "mazelink>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }
        if line.trim().is_empty() {
            continue;
        }

        match shell.execute(&line) {
            Ok((outcome, lines)) => {
                for l in lines {
                    println!("{l}");
                }
                if outcome == Outcome::Quit {
                    shutdown.store(true, Ordering::SeqCst);
                    break;
                }
            }
            Err(e) => println!("{}: {}", "Error".red(), e),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Draw the maze, north up, with the operator's view of the agent.
pub fn render_map(session: &Session) -> String {
    let grid = session.grid();
    let agent = session.operator().position();
    let mut out = String::new();
    for y in (0..grid.height()).rev() {
        for x in 0..grid.width() {
            let pos = GridPosition::new(x, y);
            let ch = if pos == agent {
                arrow(session.operator().direction())
            } else {
                match grid.cell_at(pos) {
                    Some(MazeCell::Obstacle) => '#',
                    _ => '.',
                }
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

fn arrow(direction: Direction) -> char {
    match direction {
        Direction::North => '^',
        Direction::West => '<',
        Direction::South => 'v',
        Direction::East => '>',
    }
}

fn describe(intent: Intent, phase: IntentPhase) -> String {
    let name = match intent {
        Intent::Forward => "forward".to_string(),
        Intent::Rotate { delta: Rotation::Left } => "turn left".to_string(),
        Intent::Rotate { delta: Rotation::Right } => "turn right".to_string(),
    };
    match phase {
        IntentPhase::Applied => format!("{} {}", "✓".green().bold(), name),
        IntentPhase::Rejected(RejectReason::Blocked { candidate }) => {
            format!("{} {} blocked at {}", "✗".red().bold(), name, candidate)
        }
        IntentPhase::Rejected(reason) => format!("{} {} dropped ({:?})", "✗".red().bold(), name, reason),
        other => format!("  {} {:?}", name, other),
    }
}

fn position_line(p: &Participant) -> String {
    format!("  at {} facing {}", p.position().to_string().bold(), p.direction())
}

fn help() -> Vec<String> {
    vec![
        String::new(),
        format!("{}", "Mazelink Commands".bold().underline()),
        format!("  {}   – step forward", "w  forward".bold().cyan()),
        format!("  {}      – turn left", "a  left".bold().cyan()),
        format!("  {}     – turn right", "d  right".bold().cyan()),
        format!("  {} – feed one accelerometer sample", "/tilt x y z".bold().cyan()),
        format!("  {}     – every participant's view", "/status".bold().cyan()),
        format!("  {}        – draw the maze", "/map".bold().cyan()),
        format!("  {} – send a debug echo", "/echo <text>".bold().cyan()),
        format!("  {} – exit", "/quit  /exit".bold().cyan()),
        String::new(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazelink_kernel::MazeGrid;
    use mazelink_runtime::SessionConfig;
    use mazelink_types::WorldPos;

    fn shell(layout: &str, spawn: (i32, i32)) -> Shell {
        shell_with_travel(layout, spawn, 0.5)
    }

    fn shell_with_travel(layout: &str, spawn: (i32, i32), travel_time: f32) -> Shell {
        colored::control::set_override(false);
        let grid = Arc::new(MazeGrid::from_ascii(layout, 2.0, WorldPos::default()).unwrap());
        let config = SessionConfig {
            travel_time,
            spawn: GridPosition::new(spawn.0, spawn.1),
            ..SessionConfig::default()
        };
        let session = Session::builder(grid).config(config).observers(1).build().unwrap();
        Shell::new(session, TiltInput::default(), 1.0 / 60.0)
    }

    /// Verify that `w` steps forward and `a` turns the whole session left.
    #[test]
    fn forward_then_turn() {
        let mut sh = shell("...\n...\n...", (1, 0));

        let (outcome, lines) = sh.execute("w").unwrap();
        assert_eq!(outcome, Outcome::Continue);
        assert!(lines[0].contains("forward"));
        assert_eq!(sh.session().operator().position(), GridPosition::new(1, 1));
        assert!(sh.session().is_settled());

        sh.execute("left").unwrap();
        assert_eq!(sh.session().operator().direction(), Direction::West);
        assert_eq!(sh.session().observers()[0].direction(), Direction::West);
    }

    /// Verify that a blocked step is reported and leaves the operator in place.
    #[test]
    fn blocked_step_is_reported() {
        let mut sh = shell("#..\n...", (0, 0));
        let (_, lines) = sh.execute("forward").unwrap();
        assert!(lines[0].contains("blocked at (0, 1)"));
        assert_eq!(sh.session().operator().position(), GridPosition::new(0, 0));
    }

    /// Verify that `/map` draws the agent as an arrow for its facing.
    #[test]
    fn map_shows_agent_arrow() {
        let mut sh = shell("..#\n...", (0, 0));
        assert_eq!(render_map(sh.session()), "..#\n^..\n");
        sh.execute("d").unwrap();
        assert_eq!(render_map(sh.session()), "..#\n>..\n");
    }

    /// Verify that a tilt sample past the threshold issues an intent.
    #[test]
    fn tilt_drives_the_operator() {
        let mut sh = shell("...\n...", (0, 0));
        sh.execute("/tilt 0 -0.5 -0.9").unwrap();
        assert_eq!(sh.session().operator().position(), GridPosition::new(0, 1));

        let (_, lines) = sh.execute("/tilt 0 -0.5 -0.9").unwrap();
        assert!(lines[0].contains("waiting for upright"));

        let (_, lines) = sh.execute("/tilt 1 2").unwrap();
        assert!(lines[0].contains("usage"));
    }

    /// Verify that `/status` prints a line per participant.
    #[test]
    fn status_lists_every_participant() {
        let mut sh = shell("..", (0, 0));
        let (_, lines) = sh.execute("/status").unwrap();
        // Header, authority, operator, relay, one observer.
        assert_eq!(lines.len(), 5);
    }

    /// Verify that steps longer than ten seconds settle before the next command.
    #[test]
    fn slow_steps_still_settle() {
        let mut sh = shell_with_travel("...\n...\n...", (1, 0), 20.0);

        sh.execute("w").unwrap();
        assert!(sh.session().is_settled());
        assert_eq!(sh.session().operator().position(), GridPosition::new(1, 1));

        let (_, lines) = sh.execute("w").unwrap();
        assert!(lines[0].contains("forward"));
        assert_eq!(sh.session().operator().position(), GridPosition::new(1, 2));

        sh.execute("/tilt 0 -0.5 -0.9").unwrap();
        assert!(sh.session().is_settled());
    }

    /// Verify that `/quit` ends the shell and unknown commands are reported.
    #[test]
    fn quit_and_unknown_commands() {
        let mut sh = shell("..", (0, 0));
        assert!(sh.execute("/dance").unwrap().1[0].contains("Unknown command"));
        assert!(sh.execute("/echo hi").unwrap().1[0].contains("hi"));
        assert_eq!(sh.execute("/quit").unwrap().0, Outcome::Quit);
    }
}
