//! Circular delay line with fractional reads.

/*
Delay Lines
===========

A delay line remembers the last N samples in a circular buffer. Writing
advances a "write head"; reading looks back some distance behind it.

    buffer:  [ . . . . . . . . . . ]
                   ^read      ^write
                   |<-delay-->|

Fractional Delay
----------------

A modulated delay time rarely lands on a whole sample. Reading at 10.3
samples back blends the neighbours at 10 and 11:

    y = s[10] · 0.7 + s[11] · 0.3

Linear interpolation is cheap and smooth enough for chorus-style
modulation; without it, sweeping the delay time produces zipper noise.

Read/Write Order
----------------

`process` WRITES the incoming sample first, then READS. With that order a
delay of 0 returns the input unchanged and a delay of d returns the sample
written d calls ago. The buffer keeps two guard samples so the largest
allowed delay (len - 2) can still interpolate towards the older neighbour.
*/

pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Create a delay line holding `capacity` samples (minimum 2).
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(2)],
            write_pos: 0,
        }
    }

    /// Longest delay `read_interpolated` honours, in samples.
    pub fn max_delay(&self) -> f32 {
        (self.buffer.len() - 2) as f32
    }

    /// Push one sample at the write head.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Read `delay_samples` behind the most recently written sample.
    #[inline]
    pub fn read_interpolated(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = if delay_samples.is_finite() {
            delay_samples.clamp(0.0, self.max_delay())
        } else {
            0.0
        };
        let whole = delay as usize;
        let frac = delay - whole as f32;

        // write_pos points one past the newest sample
        let newest = (self.write_pos + len - 1) % len;
        let a = self.buffer[(newest + len - whole) % len];
        let b = self.buffer[(newest + len - whole - 1) % len];
        a + (b - a) * frac
    }

    /// Write-then-read one sample.
    #[inline]
    pub fn process(&mut self, sample: f32, delay_samples: f32) -> f32 {
        self.write(sample);
        self.read_interpolated(delay_samples)
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_delay_returns_input() {
        let mut line = DelayLine::new(16);
        for i in 0..20 {
            let x = i as f32;
            assert_eq!(line.process(x, 0.0), x);
        }
    }

    #[test]
    fn integer_delay_returns_older_sample() {
        let mut line = DelayLine::new(16);
        let out: Vec<f32> = (0..10).map(|i| line.process(i as f32, 3.0)).collect();
        assert_eq!(&out[..3], &[0.0, 0.0, 0.0]);
        assert_eq!(&out[3..6], &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn fractional_delay_interpolates() {
        let mut line = DelayLine::new(16);
        for i in 0..8 {
            line.write(i as f32);
        }
        // newest = 7; 2.25 back sits between 5 and 4
        assert!((line.read_interpolated(2.25) - 4.75).abs() < 1e-6);
    }

    #[test]
    fn delay_is_clamped_to_capacity() {
        let mut line = DelayLine::new(8);
        for i in 0..8 {
            line.write(i as f32 + 1.0);
        }
        assert_eq!(line.max_delay(), 6.0);
        assert_eq!(line.read_interpolated(100.0), line.read_interpolated(6.0));
        assert_eq!(line.read_interpolated(f32::NAN), line.read_interpolated(0.0));
    }

    #[test]
    fn reset_clears_history() {
        let mut line = DelayLine::new(8);
        line.process(1.0, 0.0);
        line.reset();
        assert_eq!(line.read_interpolated(1.0), 0.0);
    }
}
