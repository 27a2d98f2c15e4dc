use crate::frame::{Frame, LEVELS};
use crate::lattice::MAX_DIMENSION;
use crate::params::ParamSnapshot;
use crate::resize::DisplayProbe;
use crate::sim::FrameSink;
use crossterm::{
    cursor, execute, queue,
    style::{Print, ResetColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Stdout, Write};

const SYMBOLS: [char; LEVELS] = [' ', '.', 'o', '*', '%', '#'];

/// Rows reserved under the grid for the status line.
pub(crate) const STATUS_ROWS: usize = 1;

pub(crate) fn symbol(level: u8) -> char {
    SYMBOLS[usize::from(level).min(LEVELS - 1)]
}

pub(crate) fn row_text(frame: &Frame, i: usize) -> String {
    frame.row(i).iter().map(|&l| symbol(l)).collect()
}

pub(crate) fn status_line(p: &ParamSnapshot) -> String {
    format!(
        "(T, P, FPS) = ({:.6}, {:.6}, {:2})",
        p.temperature, p.probability, p.fps
    )
}

/// Grid size the terminal can show: every row but the status line.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TerminalProbe;

impl DisplayProbe for TerminalProbe {
    fn dimensions(&self) -> io::Result<(usize, usize)> {
        let (cols, rows) = terminal::size()?;
        let h = usize::from(rows).saturating_sub(STATUS_ROWS).min(MAX_DIMENSION);
        let w = usize::from(cols).min(MAX_DIMENSION);
        Ok((h, w))
    }
}

/// Owns the terminal while the simulation runs; restores it on drop.
pub(crate) struct Terminal {
    out: Stdout,
    last_dims: Option<(usize, usize)>,
}

impl Terminal {
    pub(crate) fn begin() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            EnterAlternateScreen,
            DisableLineWrap,
            cursor::Hide,
            Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        Ok(Self {
            out,
            last_dims: None,
        })
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            EndSynchronizedUpdate,
            ResetColor,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

impl FrameSink for Terminal {
    fn present(&mut self, frame: &Frame, params: &ParamSnapshot) -> anyhow::Result<()> {
        let out = &mut self.out;
        queue!(out, BeginSynchronizedUpdate)?;

        let dims = (frame.height, frame.width);
        if self.last_dims != Some(dims) {
            queue!(out, Clear(ClearType::All))?;
            self.last_dims = Some(dims);
        }

        for i in 0..frame.height {
            queue!(out, cursor::MoveTo(0, i as u16), Print(row_text(frame, i)))?;
        }
        queue!(
            out,
            cursor::MoveTo(0, frame.height as u16),
            Print(status_line(params)),
            Clear(ClearType::UntilNewLine),
            EndSynchronizedUpdate
        )?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_cover_every_level() {
        let all: String = (0..LEVELS as u8).map(symbol).collect();
        assert_eq!(all, " .o*%#");
        assert_eq!(symbol(200), '#');
    }

    #[test]
    fn rows_map_levels_to_symbols() {
        let frame = Frame {
            width: 3,
            height: 2,
            levels: vec![0, 1, 2, 3, 4, 5],
        };
        assert_eq!(row_text(&frame, 0), " .o");
        assert_eq!(row_text(&frame, 1), "*%#");
    }

    #[test]
    fn status_line_shows_live_parameters() {
        let p = ParamSnapshot {
            temperature: 3.0,
            probability: 0.42,
            fps: 7,
        };
        assert_eq!(status_line(&p), "(T, P, FPS) = (3.000000, 0.420000,  7)");
    }
}
