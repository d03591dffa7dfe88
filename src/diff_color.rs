// SPDX-License-Identifier: MIT

use lazy_static::lazy_static;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::diff::{Difference, EditType};

#[derive(Default)]
struct Colors {
    default: ColorSpec,
    insert: ColorSpec,
    delete: ColorSpec,
}
impl Colors {
    fn new() -> Self {
        let mut colors = Colors {
            ..Default::default()
        };
        colors.insert.set_fg(Some(Color::Green));
        colors.delete.set_fg(Some(Color::Red)).set_strikethrough(true);
        colors
    }
}
lazy_static! {
    static ref COLORS: Colors = Colors::new();
}

fn get_color(edit: EditType) -> &'static ColorSpec {
    match edit {
        EditType::Equal => &COLORS.default,
        EditType::Insert => &COLORS.insert,
        EditType::Delete => &COLORS.delete,
    }
}

/// Write a character diff as a single continuous text with colored edits.
pub fn write_diff(out: &mut dyn WriteColor, diffs: &[Difference]) -> std::io::Result<()> {
    for diff in diffs {
        let color = get_color(diff.edit);
        if color != &COLORS.default {
            out.set_color(color)?;
        }
        out.write_all(diff.text.as_bytes())?;
        if color != &COLORS.default {
            out.reset()?;
        }
    }
    Ok(())
}
