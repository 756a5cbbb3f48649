use glam::{ivec2, IVec2};

/// Character grid maps written inline as text.
///
/// Leading blank lines and the common indentation of the remaining lines are
/// ignored, so maps can be written as indented string literals. Every
/// character, including whitespace inside the map body, is a map cell.
#[derive(Clone, Default, Debug, Eq, PartialEq)]
pub struct AsciiMap {
    lines: Vec<String>,
}

impl AsciiMap {
    pub fn new(map: &str) -> Self {
        let map = map.trim_end();

        let x_skip = map
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
            .min()
            .unwrap_or(0);

        let lines = map
            .lines()
            .skip_while(|line| line.trim().is_empty())
            .map(|line| line.chars().skip(x_skip).collect::<String>())
            .map(|line| line.trim_end().to_owned())
            .collect();

        AsciiMap { lines }
    }

    /// Width of the widest line and number of lines.
    pub fn dim(&self) -> IVec2 {
        ivec2(
            self.lines
                .iter()
                .map(|line| line.chars().count())
                .max()
                .unwrap_or(0) as i32,
            self.lines.len() as i32,
        )
    }

    /// Iterate the points and characters on the map in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, char)> + '_ {
        self.lines.iter().enumerate().flat_map(|(y, line)| {
            line.chars()
                .enumerate()
                .map(move |(x, c)| (ivec2(x as i32, y as i32), c))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn indented_map() {
        let map = AsciiMap::new(
            "
            ..#
            %..
            ",
        );
        assert_eq!(map.dim(), ivec2(3, 2));
        let cells: Vec<_> = map.iter().collect();
        assert_eq!(cells[0], (ivec2(0, 0), '.'));
        assert_eq!(cells[2], (ivec2(2, 0), '#'));
        assert_eq!(cells[3], (ivec2(0, 1), '%'));
        assert_eq!(cells.len(), 6);
    }

    #[test]
    fn empty_map() {
        let map = AsciiMap::new("   \n  ");
        assert_eq!(map.dim(), ivec2(0, 0));
        assert_eq!(map.iter().count(), 0);
    }
}
