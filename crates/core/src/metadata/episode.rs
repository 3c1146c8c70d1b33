use super::SeasonInfo;

/// Running episode index across all regular seasons.
///
/// Specials (season 0) never count. Returns `None` for season 0, when
/// the requested season is not in `seasons`, or when the index overflows.
pub fn absolute_episode(season: u32, episode: u32, seasons: &[SeasonInfo]) -> Option<u32> {
    if season == 0 || !seasons.iter().any(|s| s.number == season) {
        return None;
    }

    let preceding = seasons
        .iter()
        .filter(|s| s.number > 0 && s.number < season)
        .try_fold(0u32, |total, s| total.checked_add(s.episode_count))?;

    preceding.checked_add(episode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasons() -> Vec<SeasonInfo> {
        vec![
            SeasonInfo { number: 0, episode_count: 8 },
            SeasonInfo { number: 1, episode_count: 25 },
            SeasonInfo { number: 2, episode_count: 12 },
            SeasonInfo { number: 3, episode_count: 22 },
        ]
    }

    #[test]
    fn test_first_season_is_identity() {
        assert_eq!(absolute_episode(1, 5, &seasons()), Some(5));
    }

    #[test]
    fn test_later_season_skips_specials() {
        assert_eq!(absolute_episode(2, 1, &seasons()), Some(26));
        assert_eq!(absolute_episode(3, 4, &seasons()), Some(41));
    }

    #[test]
    fn test_unknown_or_special_season() {
        assert_eq!(absolute_episode(0, 3, &seasons()), None);
        assert_eq!(absolute_episode(7, 1, &seasons()), None);
        assert_eq!(absolute_episode(1, 1, &[]), None);
    }

    #[test]
    fn test_overflow_yields_none() {
        let seasons = vec![
            SeasonInfo { number: 1, episode_count: 25 },
            SeasonInfo { number: 2, episode_count: 12 },
        ];
        assert_eq!(absolute_episode(2, u32::MAX, &seasons), None);

        let huge = vec![
            SeasonInfo { number: 1, episode_count: u32::MAX },
            SeasonInfo { number: 2, episode_count: u32::MAX },
            SeasonInfo { number: 3, episode_count: 1 },
        ];
        assert_eq!(absolute_episode(3, 1, &huge), None);
    }
}
