//! Terminal host for the paramview shell

use std::io::{self, stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, ClearType},
};
use paramview_core::{
    loader, Control, EditKey, GeometryFactory, LoadError, LoadTicket, PointerButton, Surface,
    ViewerConfig, ViewerError, ViewerShell,
};
use tracing::{debug, info, warn};

pub mod renderer;

pub use renderer::{AsciiRenderer, ROW_SCALE};

/// Width reserved for the parameter panel overlay
const PANEL_WIDTH: u16 = 30;

/// What the app is showing
#[derive(Debug)]
pub enum Mode {
    /// A parametric shape with a live panel
    Shape,
    /// Model files cycled with `n`
    Editor { files: Vec<PathBuf>, next: usize },
}

/// Completed background load
struct LoadMessage {
    ticket: LoadTicket,
    path: PathBuf,
    result: Result<Surface, LoadError>,
}

/// Main application struct for terminal rendering
pub struct TerminalApp {
    shell: ViewerShell<AsciiRenderer>,
    mode: Mode,
    load_tx: Sender<LoadMessage>,
    load_rx: Receiver<LoadMessage>,
    running: bool,
    started: Instant,
    last_fps: Instant,
    frame_count: u32,
    fps: f32,
    show_panel: bool,
    status: Option<String>,
}

/// Logical viewport for a terminal of `columns` x `rows`
fn viewport(columns: u16, rows: u16) -> (u32, u32) {
    (columns.max(1) as u32, rows.max(1) as u32 * ROW_SCALE)
}

impl TerminalApp {
    fn with_shell(shell: ViewerShell<AsciiRenderer>, mode: Mode) -> Self {
        let (load_tx, load_rx) = mpsc::channel();
        Self {
            shell,
            mode,
            load_tx,
            load_rx,
            running: true,
            started: Instant::now(),
            last_fps: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            show_panel: true,
            status: None,
        }
    }

    fn new_shell(config: ViewerConfig) -> Result<ViewerShell<AsciiRenderer>> {
        let (columns, rows) = terminal::size().context("reading terminal size")?;
        let (width, height) = viewport(columns, rows);
        let renderer = AsciiRenderer::new(columns as usize, rows as usize);
        Ok(ViewerShell::new(renderer, config, width, height)?)
    }

    /// Show `factory` with `overrides` applied as `name=value` edits.
    pub fn shape(
        factory: Arc<dyn GeometryFactory>,
        config: ViewerConfig,
        overrides: &[(String, String)],
    ) -> Result<Self> {
        let mut shell = Self::new_shell(config)?.with_shape(factory)?;
        for (name, value) in overrides {
            shell
                .set_param_str(name, value)
                .with_context(|| format!("applying --param {name}={value}"))?;
        }
        Ok(Self::with_shell(shell, Mode::Shape))
    }

    /// Open the model editor on `files`, loading the first one.
    pub fn editor(files: Vec<PathBuf>, config: ViewerConfig) -> Result<Self> {
        let shell = Self::new_shell(config)?;
        let mut app = Self::with_shell(shell, Mode::Editor { files, next: 0 });
        app.load_next();
        Ok(app)
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        self.shell.start();
        let result = self.main_loop();
        self.shell.dispose();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }
            self.drain_loads();

            // Update and draw
            self.shell.frame(self.started.elapsed().as_secs_f32())?;
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_fps).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps).as_secs_f32();
                self.frame_count = 0;
                self.last_fps = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => {
                let (width, height) = viewport(columns, rows);
                self.shell.resize(width, height);
                debug!(columns, rows, "terminal resized");
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, .. }: KeyEvent) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
                return;
            }
            KeyCode::Char('p') => {
                self.show_panel = !self.show_panel;
                return;
            }
            KeyCode::Char('w') => {
                let renderer = self.shell.backend_mut();
                renderer.show_wireframe = !renderer.show_wireframe;
                return;
            }
            KeyCode::Char('f') => {
                let renderer = self.shell.backend_mut();
                renderer.show_faces = !renderer.show_faces;
                return;
            }
            _ => {}
        }

        match self.mode {
            Mode::Shape => self.handle_panel_key(code),
            Mode::Editor { .. } => self.handle_editor_key(code),
        }
    }

    fn handle_panel_key(&mut self, code: KeyCode) {
        let result = match code {
            KeyCode::Tab | KeyCode::Down => {
                self.shell.select_next_param();
                Ok(false)
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.shell.select_prev_param();
                Ok(false)
            }
            KeyCode::Char(']') | KeyCode::Right | KeyCode::Char(' ') => {
                self.shell.step_selected(1)
            }
            KeyCode::Char('[') | KeyCode::Left => self.shell.step_selected(-1),
            KeyCode::Backspace => self.shell.reset_params().map(|()| true),
            _ => Ok(false),
        };
        self.report(result);
    }

    fn handle_editor_key(&mut self, code: KeyCode) {
        let key = match code {
            KeyCode::Up => Some(EditKey::Up),
            KeyCode::Down => Some(EditKey::Down),
            KeyCode::Left => Some(EditKey::Left),
            KeyCode::Right => Some(EditKey::Right),
            KeyCode::Char(c) => EditKey::from_key_name(c.encode_utf8(&mut [0; 4])),
            _ => None,
        };
        match (key, code) {
            (Some(key), _) => {
                if !self.shell.handle_key(key) {
                    self.status = Some("no model loaded".to_string());
                }
            }
            (None, KeyCode::Char('n')) => self.load_next(),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, MouseEvent { kind, column, row, modifiers }: MouseEvent) {
        let x = column as f32;
        let y = row as f32 * ROW_SCALE as f32;
        match kind {
            MouseEventKind::Down(MouseButton::Left) if modifiers.contains(KeyModifiers::SHIFT) => {
                self.shell.pointer_down(x, y, PointerButton::Secondary)
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.shell.pointer_down(x, y, PointerButton::Primary)
            }
            MouseEventKind::Down(MouseButton::Right) => {
                self.shell.pointer_down(x, y, PointerButton::Secondary)
            }
            MouseEventKind::Drag(_) => self.shell.pointer_move(x, y),
            MouseEventKind::Up(_) => self.shell.pointer_up(),
            MouseEventKind::ScrollUp => self.shell.wheel(-1.0),
            MouseEventKind::ScrollDown => self.shell.wheel(1.0),
            _ => {}
        }
    }

    fn report(&mut self, result: Result<bool, ViewerError>) {
        match result {
            Ok(true) => self.status = None,
            Ok(false) => {}
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    /// Start loading the next file on a worker thread. Any load still in
    /// flight is superseded.
    fn load_next(&mut self) {
        let Mode::Editor { files, next } = &mut self.mode else {
            return;
        };
        let Some(path) = files.get(*next % files.len().max(1)).cloned() else {
            self.status = Some("no model files given".to_string());
            return;
        };
        *next += 1;

        let ticket = self.shell.begin_load();
        info!(path = %path.display(), ticket = ticket.id(), "loading model");
        self.status = Some(format!("loading {}", path.display()));

        let tx = self.load_tx.clone();
        thread::spawn(move || {
            let result = loader::load_path(&path);
            if tx.send(LoadMessage { ticket, path, result }).is_err() {
                debug!("viewer closed before load finished");
            }
        });
    }

    fn drain_loads(&mut self) {
        while let Ok(LoadMessage { ticket, path, result }) = self.load_rx.try_recv() {
            match self.shell.finish_load(ticket, result) {
                Ok(true) => self.status = Some(format!("loaded {}", display_name(&path))),
                Ok(false) => {}
                Err(err) => {
                    warn!(path = %path.display(), %err, "could not load model");
                    self.status = Some(format!("{}: {err}", display_name(&path)));
                }
            }
        }
    }

    fn render(&mut self) -> Result<()> {
        let mut stdout = stdout();
        self.shell.backend().present(&mut stdout)?;

        let (columns, rows) = terminal::size()?;
        let title = match (&self.mode, self.shell.shape_kind()) {
            (Mode::Shape, Some(kind)) => format!("paramview | {kind}"),
            _ => "paramview | editor".to_string(),
        };
        let help = match self.mode {
            Mode::Shape => "Tab=Select [/]=Step Bksp=Reset",
            Mode::Editor { .. } => "Arrows=Move/Turn +/-=Scale N=Next",
        };
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(clip(
                &format!(
                    "{title} | FPS: {:.1} | {help} Drag=Orbit Wheel=Zoom W/F/P Q=Quit",
                    self.fps
                ),
                columns
            )),
            ResetColor
        )?;

        if self.show_panel {
            let controls = self.shell.controls();
            let selected = self.shell.panel().map(|p| p.selected_index());
            draw_panel(&mut stdout, &controls, selected, columns)?;
        }

        if let Some(status) = &self.status {
            queue!(
                stdout,
                cursor::MoveTo(0, rows.saturating_sub(1)),
                terminal::Clear(ClearType::CurrentLine),
                SetForegroundColor(Color::Magenta),
                Print(clip(status, columns)),
                ResetColor
            )?;
        }

        stdout.flush()?;
        Ok(())
    }
}

fn draw_panel<W: Write>(
    out: &mut W,
    controls: &[Control],
    selected: Option<usize>,
    columns: u16,
) -> io::Result<()> {
    if columns <= PANEL_WIDTH {
        return Ok(());
    }
    let left = columns - PANEL_WIDTH;
    for (i, control) in controls.iter().enumerate() {
        let marker = if Some(i) == selected { '>' } else { ' ' };
        let line = format!(
            "{marker} {:<16} {:>10}",
            control.name,
            control.display_value()
        );
        queue!(out, cursor::MoveTo(left, i as u16 + 1))?;
        if Some(i) == selected {
            queue!(out, SetAttribute(Attribute::Reverse))?;
        }
        queue!(
            out,
            SetForegroundColor(Color::Yellow),
            Print(clip(&line, PANEL_WIDTH)),
            SetAttribute(Attribute::Reset),
            ResetColor
        )?;
    }
    Ok(())
}

fn clip(text: &str, width: u16) -> String {
    text.chars().take(width as usize).collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramview_core::shapes::TorusFactory;

    #[test]
    fn test_viewport_doubles_rows() {
        assert_eq!(viewport(80, 24), (80, 48));
        assert_eq!(viewport(0, 0), (1, 2));
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("abcdef", 3), "abc");
        assert_eq!(clip("ab", 3), "ab");
    }

    #[test]
    fn test_panel_marks_selection() {
        let panel = paramview_core::ParameterPanel::new(TorusFactory.schema()).unwrap();
        let mut out = Vec::new();
        draw_panel(&mut out, &panel.controls(), Some(1), 80).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("> tube"));
        assert!(text.contains("  radius"));
    }

    #[test]
    fn test_panel_hidden_on_narrow_terminal() {
        let mut out = Vec::new();
        draw_panel(&mut out, &[], None, PANEL_WIDTH).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/models/part.stl")), "part.stl");
    }
}
