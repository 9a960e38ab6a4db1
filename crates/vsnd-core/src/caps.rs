//! Capability queries and configuration requests exchanged between the audio
//! framework and a driver.

use std::ops::{BitOr, BitOrAssign};
use std::time::Duration;

macro_rules! mask_type {
    ($(#[$meta:meta])* $name:ident { $($(#[$cmeta:meta])* $flag:ident = $bit:expr,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            pub const EMPTY: $name = $name(0);
            $($(#[$cmeta])* pub const $flag: $name = $name(1 << $bit);)*

            pub const fn from_bits(bits: u32) -> $name {
                $name(bits)
            }

            pub const fn bits(self) -> u32 {
                self.0
            }

            pub const fn contains(self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl BitOr for $name {
            type Output = $name;

            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: $name) {
                self.0 |= rhs.0;
            }
        }
    };
}

mask_type! {
    /// Set of capability categories a device supports.
    TypeMask {
        QUERY = 0,
        INPUT = 1,
        OUTPUT = 2,
        MIXER = 3,
    }
}

mask_type! {
    /// Set of mixer controls a device exposes.
    MixerMask {
        VOLUME = 0,
        DIGITAL = 1,
        LINE = 2,
        MIC = 3,
        EXTEND = 4,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapsType {
    Query,
    Input,
    Output,
    Mixer,
}

impl CapsType {
    pub fn mask(self) -> TypeMask {
        match self {
            CapsType::Query => TypeMask::QUERY,
            CapsType::Input => TypeMask::INPUT,
            CapsType::Output => TypeMask::OUTPUT,
            CapsType::Mixer => TypeMask::MIXER,
        }
    }
}

/// Sub-category of an input or output stream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DspParam {
    /// The whole format at once.
    Param,
    SampleRate,
    Channels,
    SampleBits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MixerParam {
    Query,
    Volume,
    Digital,
    Line,
    Mic,
    Extend,
}

impl MixerParam {
    pub fn mask(self) -> MixerMask {
        match self {
            MixerParam::Query => MixerMask::EMPTY,
            MixerParam::Volume => MixerMask::VOLUME,
            MixerParam::Digital => MixerMask::DIGITAL,
            MixerParam::Line => MixerMask::LINE,
            MixerParam::Mic => MixerMask::MIC,
            MixerParam::Extend => MixerMask::EXTEND,
        }
    }
}

/// PCM stream format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_bits: u16,
}

impl AudioConfig {
    pub const fn new(sample_rate: u32, channels: u16, sample_bits: u16) -> AudioConfig {
        AudioConfig {
            sample_rate,
            channels,
            sample_bits,
        }
    }

    pub fn bytes_per_frame(&self) -> u64 {
        u64::from(self.channels) * u64::from(self.sample_bits) / 8
    }

    pub fn bytes_per_second(&self) -> u64 {
        u64::from(self.sample_rate) * self.bytes_per_frame()
    }

    /// Time it takes to play `block_size` bytes in this format.
    ///
    /// Returns `None` if the format has no throughput (zero rate, channels or
    /// sample width).
    pub fn block_duration(&self, block_size: usize) -> Option<Duration> {
        let rate = self.bytes_per_second();
        if rate == 0 {
            return None;
        }

        let nanos = (block_size as u128) * 1_000_000_000 / u128::from(rate);
        Some(Duration::from_nanos(nanos.min(u128::from(u64::MAX)) as u64))
    }
}

impl Default for AudioConfig {
    fn default() -> AudioConfig {
        AudioConfig::new(44100, 2, 16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapsQuery {
    Query(CapsType),
    Input(DspParam),
    Output(DspParam),
    Mixer(MixerParam),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapsValue {
    Types(TypeMask),
    Config(AudioConfig),
    Mixer(MixerMask),
    Value(i32),
    /// The query is supported but carries no data.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Configure {
    Query(CapsType),
    Input { param: DspParam, config: AudioConfig },
    Output { param: DspParam, config: AudioConfig },
    Mixer { param: MixerParam, value: i32 },
}

impl Configure {
    pub fn volume(value: i32) -> Configure {
        Configure::Mixer {
            param: MixerParam::Volume,
            value,
        }
    }
}

/// Layout of a driver's transmit buffer.
///
/// The framework fills `block_size` bytes at a time and expects one completion
/// signal per consumed block.
#[derive(Debug, Clone, Copy)]
pub struct BufInfo<'a> {
    pub buffer: &'a [u8],
    pub total_size: usize,
    pub block_size: usize,
    pub block_count: usize,
}
