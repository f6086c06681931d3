/// argmax returns the index of the maximum value in the array x.
pub fn argmax<T: std::cmp::PartialOrd + std::marker::Copy>(x: &[T]) -> usize {
    let mut idx_max = 0;
    let mut val_max = x[0];

    for (i, &val) in x.iter().enumerate().skip(1) {
        if val > val_max {
            val_max = val;
            idx_max = i;
        }
    }

    idx_max
}

#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that would sort an array.
pub fn argsort<T: std::cmp::PartialOrd>(x: &[T], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    match order {
        SortOrder::Ascending => indices.sort_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap()),
        SortOrder::Descending => indices.sort_by(|&a, &b| x[b].partial_cmp(&x[a]).unwrap()),
    }
    indices
}

/// format_race_time renders race seconds as m:ss, e.g. 83.4 becomes "1:23".
pub fn format_race_time(race_time_s: f64) -> String {
    let total_s = if race_time_s.is_finite() && race_time_s > 0.0 {
        race_time_s as u64
    } else {
        0
    };
    format!("{}:{:02}", total_s / 60, total_s % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_returns_first_largest() {
        assert_eq!(argmax(&[1.0, 5.0, 3.0]), 1);
        assert_eq!(argmax(&[7, 7, 2]), 0);
    }

    #[test]
    fn argsort_orders_indices() {
        let x = vec![2.0, 9.0, 4.0];
        assert_eq!(argsort(&x, SortOrder::Descending), vec![1, 2, 0]);
        assert_eq!(argsort(&x, SortOrder::Ascending), vec![0, 2, 1]);
    }

    #[test]
    fn format_race_time_pads_seconds() {
        assert_eq!(format_race_time(0.0), "0:00");
        assert_eq!(format_race_time(9.7), "0:09");
        assert_eq!(format_race_time(83.4), "1:23");
        assert_eq!(format_race_time(-3.0), "0:00");
    }
}
