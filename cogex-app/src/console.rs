use cogex_core::Stimulus;
use cogex_experiment::{Display, Surface};

/// Prints status lines as they change and, optionally, every frame.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    frames: bool,
    last_status: Option<String>,
}

impl ConsoleSurface {
    pub fn new(frames: bool) -> Self {
        Self {
            frames,
            last_status: None,
        }
    }
}

pub fn render(display: &Display) -> Option<String> {
    let text = match display {
        Display::Blank => return None,
        Display::Prompt { text } => text.clone(),
        Display::Reaction { cue } => format!("[{}]", cue.describe().to_uppercase()),
        Display::ColorWord { stimulus, trial, of } => {
            format!("{trial}/{of} {}", stimulus.describe())
        }
        Display::Letter { letter, index } => format!("#{} {}", index + 1, letter.describe()),
        Display::Signal { signal, trial, of } => {
            format!("{trial}/{of} {}", signal.describe())
        }
        Display::Pads { lit, accepting } => match (lit, accepting) {
            (Some(pad), _) => format!("pad {}", pad.describe()),
            (None, true) => "your turn".to_string(),
            (None, false) => return None,
        },
        Display::Grid {
            side,
            lit,
            selected,
            accepting,
        } => {
            let mut rows = Vec::with_capacity(*side);
            for row in 0..*side {
                let line: String = (0..*side)
                    .map(|col| {
                        let cell = row * side + col;
                        if lit.contains(&cell) {
                            '#'
                        } else if selected.contains(&cell) {
                            'x'
                        } else {
                            '.'
                        }
                    })
                    .collect();
                rows.push(line);
            }
            if *accepting {
                rows.push("select the lit cells".to_string());
            }
            rows.join("\n")
        }
    };
    Some(text)
}

impl Surface for ConsoleSurface {
    fn show(&mut self, display: &Display) {
        if !self.frames {
            return;
        }
        if let Some(text) = render(display) {
            println!("{text}");
        }
    }

    fn status(&mut self, line: &str) {
        if self.last_status.as_deref() != Some(line) {
            println!("  {line}");
            self.last_status = Some(line.to_string());
        }
    }

    fn clear(&mut self) {
        self.last_status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogex_core::{ColorWord, InkColor, ReactionCue, Signal};

    #[test]
    fn grid_frames_mark_lit_and_selected_cells() {
        let text = render(&Display::Grid {
            side: 3,
            lit: vec![0, 4],
            selected: vec![8],
            accepting: false,
        })
        .unwrap();
        assert_eq!(text, "#..\n.#.\n..x");
    }

    #[test]
    fn trial_counters_print_as_sent() {
        let stimulus = ColorWord {
            word: InkColor::Red,
            ink: InkColor::Blue,
        };
        let first = render(&Display::ColorWord {
            stimulus,
            trial: 1,
            of: 20,
        });
        assert_eq!(first, Some(format!("1/20 {}", stimulus.describe())));

        let last = render(&Display::Signal {
            signal: Signal::NoGo,
            trial: 30,
            of: 30,
        });
        assert_eq!(last.as_deref(), Some("30/30 no-go"));
    }

    #[test]
    fn blank_frames_print_nothing() {
        assert_eq!(render(&Display::Blank), None);
        assert_eq!(
            render(&Display::Reaction {
                cue: ReactionCue::Go
            })
            .as_deref(),
            Some("[GO]")
        );
    }
}
