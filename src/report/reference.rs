//! Static reference data

use crate::TeamId;

/// Rugby World Cup winners by tournament year
pub const WORLD_CUP_WINNERS: &[(i32, &str)] = &[
    (1987, "New Zealand"),
    (1991, "Australia"),
    (1995, "South Africa"),
    (1999, "Australia"),
    (2003, "England"),
    (2007, "South Africa"),
    (2011, "New Zealand"),
    (2015, "New Zealand"),
    (2019, "South Africa"),
    (2023, "South Africa"),
];

pub fn world_cup_titles(team: &TeamId) -> usize {
    WORLD_CUP_WINNERS
        .iter()
        .filter(|(_, winner)| *winner == team.as_str())
        .count()
}

/// Title counts, most titles first
pub fn title_counts() -> Vec<(&'static str, usize)> {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for (_, winner) in WORLD_CUP_WINNERS {
        match counts.iter_mut().find(|(team, _)| team == winner) {
            Some((_, n)) => *n += 1,
            None => counts.push((*winner, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles() {
        assert_eq!(world_cup_titles(&TeamId::from("South Africa")), 4);
        assert_eq!(world_cup_titles(&TeamId::from("England")), 1);
        assert_eq!(world_cup_titles(&TeamId::from("France")), 0);

        let counts = title_counts();
        assert_eq!(
            counts,
            vec![
                ("South Africa", 4),
                ("New Zealand", 3),
                ("Australia", 2),
                ("England", 1)
            ]
        );
    }
}
