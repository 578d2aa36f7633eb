pub struct Math {}
impl Math {
    pub fn mean(nums: &[f64]) -> f64 {
        let sum: f64 = nums.iter().sum();
        let len = nums.len() as f64;
        sum / len
    }

    /// population standard deviation, divides by the amount of samples
    pub fn standard_deviation(nums: &[f64]) -> f64 {
        let mean = Math::mean(nums);
        let mut sum = 0.0;
        for num in nums {
            sum += (num - mean).powi(2);
        }

        (sum / nums.len() as f64).sqrt()
    }

    pub fn min(nums: &[f64]) -> f64 {
        nums.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// the last `n` elements of a slice, or the whole slice when it is shorter
    pub fn tail<T>(items: &[T], n: usize) -> &[T] {
        &items[items.len().saturating_sub(n)..]
    }
}

#[cfg(test)]
mod tests {
    use super::Math;

    #[test]
    fn standard_deviation_uses_population_variance() {
        let nums = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(Math::mean(&nums), 5.0);
        assert_eq!(Math::standard_deviation(&nums), 2.0);
    }

    #[test]
    fn tail_is_bounded_by_length() {
        let nums = [1, 2, 3];
        assert_eq!(Math::tail(&nums, 2), &[2, 3]);
        assert_eq!(Math::tail(&nums, 10), &[1, 2, 3]);
        assert_eq!(Math::min(&[3.5, 1.25, 2.0]), 1.25);
    }
}
