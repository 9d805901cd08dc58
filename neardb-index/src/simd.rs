//! # SIMD-Accelerated Distance Kernels
//!
//! Raw vector math used by the distance metrics. Callers guarantee equal
//! lengths; the checked entry points live in [`crate::metric`].
//!
//! Dispatch order: AVX2+FMA (x86_64) > NEON (aarch64) > scalar.
//! Every kernel is symmetric in its arguments.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

/// Dot product of two vectors
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            return unsafe { dot_product_avx2_fma(a, b) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        return unsafe { dot_product_neon(a, b) };
    }

    #[allow(unreachable_code)]
    dot_product_scalar(a, b)
}

/// Squared Euclidean distance
#[inline]
pub fn l2_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            return unsafe { l2_squared_avx2_fma(a, b) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        return unsafe { l2_squared_neon(a, b) };
    }

    #[allow(unreachable_code)]
    l2_squared_scalar(a, b)
}

/// Sum of absolute differences
#[inline]
pub fn manhattan_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { manhattan_avx2(a, b) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        return unsafe { manhattan_neon(a, b) };
    }

    #[allow(unreachable_code)]
    manhattan_scalar(a, b)
}

/// Vector norm (magnitude).
///
/// When the squared norm over- or underflows `f32`, components are divided
/// by the largest magnitude before squaring.
#[inline]
pub fn norm(v: &[f32]) -> f32 {
    let squared = dot_product(v, v);
    if squared_in_range(squared) {
        return squared.sqrt();
    }
    let max = max_abs(v);
    if max == 0.0 || !max.is_finite() {
        return max;
    }
    let scaled: f32 = v
        .iter()
        .map(|x| {
            let y = x / max;
            y * y
        })
        .sum();
    max * scaled.sqrt()
}

/// Normalize vector in-place. Zero vectors are left untouched.
///
/// Works for any finite components, including ones whose squares are not
/// representable in `f32`.
#[inline]
pub fn normalize(v: &mut [f32]) {
    let mut squared = dot_product(v, v);
    if !squared_in_range(squared) {
        let max = max_abs(v);
        if max == 0.0 || !max.is_finite() {
            return;
        }
        for x in v.iter_mut() {
            *x /= max;
        }
        squared = dot_product(v, v);
    }
    let inv_n = 1.0 / squared.sqrt();
    for x in v.iter_mut() {
        *x *= inv_n;
    }
}

#[inline]
fn squared_in_range(squared: f32) -> bool {
    squared.is_finite() && squared >= f32::MIN_POSITIVE
}

fn max_abs(v: &[f32]) -> f32 {
    v.iter().fold(0.0f32, |max, x| max.max(x.abs()))
}

/// Normalize vector, returning new vec
#[inline]
pub fn normalized(v: &[f32]) -> Vec<f32> {
    let mut result = v.to_vec();
    normalize(&mut result);
    result
}

// ============================================================================
// Scalar implementations (fallback)
// ============================================================================

#[inline]
fn dot_product_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
fn l2_squared_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[inline]
fn manhattan_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

// ============================================================================
// AVX2 + FMA implementations (256-bit, 8 floats at a time)
// ============================================================================

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn dot_product_avx2_fma(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len();
    let chunks = n / 8;

    let mut sum = _mm256_setzero_ps();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..chunks {
        let offset = i * 8;
        let va = _mm256_loadu_ps(a_ptr.add(offset));
        let vb = _mm256_loadu_ps(b_ptr.add(offset));
        sum = _mm256_fmadd_ps(va, vb, sum);
    }

    let mut result = hsum256_ps(sum);
    for i in chunks * 8..n {
        result += a[i] * b[i];
    }
    result
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn l2_squared_avx2_fma(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len();
    let chunks = n / 8;

    let mut sum = _mm256_setzero_ps();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..chunks {
        let offset = i * 8;
        let va = _mm256_loadu_ps(a_ptr.add(offset));
        let vb = _mm256_loadu_ps(b_ptr.add(offset));
        let diff = _mm256_sub_ps(va, vb);
        sum = _mm256_fmadd_ps(diff, diff, sum);
    }

    let mut result = hsum256_ps(sum);
    for i in chunks * 8..n {
        let d = a[i] - b[i];
        result += d * d;
    }
    result
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn manhattan_avx2(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len();
    let chunks = n / 8;

    // Clearing the sign bit gives |x|
    let sign_mask = _mm256_set1_ps(-0.0);
    let mut sum = _mm256_setzero_ps();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..chunks {
        let offset = i * 8;
        let va = _mm256_loadu_ps(a_ptr.add(offset));
        let vb = _mm256_loadu_ps(b_ptr.add(offset));
        let diff = _mm256_sub_ps(va, vb);
        sum = _mm256_add_ps(sum, _mm256_andnot_ps(sign_mask, diff));
    }

    let mut result = hsum256_ps(sum);
    for i in chunks * 8..n {
        result += (a[i] - b[i]).abs();
    }
    result
}

// ============================================================================
// Horizontal sums
// ============================================================================

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
#[inline]
unsafe fn hsum256_ps(v: __m256) -> f32 {
    let high = _mm256_extractf128_ps(v, 1);
    let low = _mm256_castps256_ps128(v);
    let sum128 = _mm_add_ps(high, low);

    let shuf = _mm_movehdup_ps(sum128); // [1,1,3,3]
    let sums = _mm_add_ps(sum128, shuf); // [0+1,_,2+3,_]
    let shuf = _mm_movehl_ps(sums, sums); // [2+3,...]
    let sums = _mm_add_ss(sums, shuf);
    _mm_cvtss_f32(sums)
}

// ============================================================================
// ARM NEON implementations (128-bit, 4 floats at a time)
// ============================================================================

#[cfg(target_arch = "aarch64")]
#[inline]
unsafe fn dot_product_neon(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len();
    let chunks = n / 4;

    let mut sum = vdupq_n_f32(0.0);
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..chunks {
        let offset = i * 4;
        let va = vld1q_f32(a_ptr.add(offset));
        let vb = vld1q_f32(b_ptr.add(offset));
        sum = vfmaq_f32(sum, va, vb);
    }

    let mut result = vaddvq_f32(sum);
    for i in chunks * 4..n {
        result += a[i] * b[i];
    }
    result
}

#[cfg(target_arch = "aarch64")]
#[inline]
unsafe fn l2_squared_neon(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len();
    let chunks = n / 4;

    let mut sum = vdupq_n_f32(0.0);
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..chunks {
        let offset = i * 4;
        let va = vld1q_f32(a_ptr.add(offset));
        let vb = vld1q_f32(b_ptr.add(offset));
        let diff = vsubq_f32(va, vb);
        sum = vfmaq_f32(sum, diff, diff);
    }

    let mut result = vaddvq_f32(sum);
    for i in chunks * 4..n {
        let d = a[i] - b[i];
        result += d * d;
    }
    result
}

#[cfg(target_arch = "aarch64")]
#[inline]
unsafe fn manhattan_neon(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len();
    let chunks = n / 4;

    let mut sum = vdupq_n_f32(0.0);
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..chunks {
        let offset = i * 4;
        let va = vld1q_f32(a_ptr.add(offset));
        let vb = vld1q_f32(b_ptr.add(offset));
        sum = vaddq_f32(sum, vabdq_f32(va, vb));
    }

    let mut result = vaddvq_f32(sum);
    for i in chunks * 4..n {
        result += (a[i] - b[i]).abs();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernels_match_scalar_with_remainder() {
        let a: Vec<f32> = (0..19).map(|i| (i as f32 * 0.37).sin()).collect();
        let b: Vec<f32> = (0..19).map(|i| (i as f32 * 0.11).cos()).collect();

        assert!((dot_product(&a, &b) - dot_product_scalar(&a, &b)).abs() < 1e-4);
        assert!((l2_distance_squared(&a, &b) - l2_squared_scalar(&a, &b)).abs() < 1e-4);
        assert!((manhattan_distance(&a, &b) - manhattan_scalar(&a, &b)).abs() < 1e-4);
    }

    #[test]
    fn test_normalize_zero_vector() {
        let mut v = vec![0.0; 5];
        normalize(&mut v);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_normalize_huge_components() {
        let mut v = vec![1e20, 3e19];
        normalize(&mut v);
        assert!((norm(&v) - 1.0).abs() < 1e-6);
        assert!((v[1] / v[0] - 0.3).abs() < 1e-6);

        let v = normalized(&[f32::MAX, f32::MAX, -f32::MAX]);
        let expected = 1.0 / 3.0f32.sqrt();
        assert!(v.iter().all(|x| (x.abs() - expected).abs() < 1e-6));
        assert!(v[2] < 0.0);
    }

    #[test]
    fn test_normalize_tiny_components() {
        let v = normalized(&[1e-30, 0.0, -1e-30]);
        let expected = 1.0 / 2.0f32.sqrt();
        assert!((v[0] - expected).abs() < 1e-6);
        assert_eq!(v[1], 0.0);
        assert!((v[2] + expected).abs() < 1e-6);

        let v = normalized(&[f32::from_bits(1), 0.0]);
        assert_eq!(v, vec![1.0, 0.0]);
    }

    #[test]
    fn test_norm_scaled() {
        assert_eq!(norm(&[3.0, 4.0]), 5.0);
        assert!((norm(&[3e30, 4e30]) / 5e30 - 1.0).abs() < 1e-6);
        assert!((norm(&[3e-30, 4e-30]) / 5e-30 - 1.0).abs() < 1e-6);
        assert_eq!(norm(&[0.0, 0.0]), 0.0);
        assert_eq!(norm(&[f32::MAX, f32::MAX]), f32::INFINITY);
    }
}
