//! 环形缓冲区与移动平均
//!
//! 容量必须是 2 的幂：下标回绕用掩码完成。容量不合法属于配置错误，
//! 在构造时返回 `DriverError::InvalidConfig`。

use crate::error::DriverError;

/// 固定容量的环形缓冲区（写满后覆盖最旧的值）
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    mask: usize,
    /// 下一次写入的位置
    head: usize,
}

impl<T: Copy> RingBuffer<T> {
    /// 创建容量为 `capacity` 的缓冲区，全部填充为 `init`
    pub fn with_capacity(capacity: usize, init: T) -> Result<Self, DriverError> {
        if !capacity.is_power_of_two() {
            return Err(DriverError::InvalidConfig(format!(
                "ring buffer capacity must be a power of two, got {}",
                capacity
            )));
        }
        Ok(Self {
            buffer: vec![init; capacity],
            mask: capacity - 1,
            head: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// 写入一个值，返回被覆盖的最旧值
    pub fn push(&mut self, value: T) -> T {
        let old = std::mem::replace(&mut self.buffer[self.head], value);
        self.head = (self.head + 1) & self.mask;
        old
    }

    /// 全部填充为 `value`
    pub fn fill(&mut self, value: T) {
        self.buffer.fill(value);
        self.head = 0;
    }
}

/// 移动平均
///
/// 第一个样本会填满整个窗口，避免启动时平均值从 0 爬升。
#[derive(Debug, Clone)]
pub struct MovingAverage {
    buffer: RingBuffer<f64>,
    sum: f64,
    primed: bool,
}

impl MovingAverage {
    pub fn with_window(window: usize) -> Result<Self, DriverError> {
        Ok(Self {
            buffer: RingBuffer::with_capacity(window, 0.0)?,
            sum: 0.0,
            primed: false,
        })
    }

    pub fn window(&self) -> usize {
        self.buffer.capacity()
    }

    /// 加入一个样本，返回新的平均值
    pub fn push(&mut self, sample: f64) -> f64 {
        if self.primed {
            let old = self.buffer.push(sample);
            self.sum += sample - old;
        } else {
            self.buffer.fill(sample);
            self.sum = sample * self.window() as f64;
            self.primed = true;
        }
        self.value()
    }

    pub fn value(&self) -> f64 {
        self.sum / self.window() as f64
    }

    /// 清空，下一个样本重新填满窗口
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.sum = 0.0;
        self.primed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_must_be_power_of_two() {
        assert!(RingBuffer::with_capacity(512, 0u16).is_ok());
        assert!(RingBuffer::with_capacity(1, 0u16).is_ok());
        assert!(matches!(
            RingBuffer::with_capacity(500, 0u16),
            Err(DriverError::InvalidConfig(_))
        ));
        assert!(RingBuffer::with_capacity(0, 0u16).is_err());
        assert!(MovingAverage::with_window(3).is_err());
    }

    #[test]
    fn test_ring_buffer_wraps() {
        let mut buf = RingBuffer::with_capacity(4, 0).unwrap();
        for v in 1..=4 {
            assert_eq!(buf.push(v), 0);
        }
        assert_eq!(buf.push(5), 1);
        assert_eq!(buf.push(6), 2);
        // 第 7 次写入覆盖 3
        assert_eq!(buf.push(7), 3);
    }

    #[test]
    fn test_first_sample_fills_window() {
        let mut avg = MovingAverage::with_window(8).unwrap();
        assert_eq!(avg.push(4000.0), 4000.0);
        // 一个新样本只改变 1/8
        assert_eq!(avg.push(4800.0), 4100.0);
    }

    #[test]
    fn test_average_converges_after_window() {
        let mut avg = MovingAverage::with_window(4).unwrap();
        avg.push(1.0);
        for _ in 0..4 {
            avg.push(3.0);
        }
        assert!((avg.value() - 3.0).abs() < 1e-12);

        avg.reset();
        assert_eq!(avg.push(10.0), 10.0);
    }
}
