//! Primary movie dataset wrapped by every project file.
//!
//! The project core treats the movie mostly as opaque: it needs the record
//! count, the raw/text flag and the input configuration. The reference
//! serializer lives in [`fm2`].

mod fm2;

pub use fm2::*;

/// Movie format revision written into the header.
pub const MOVIE_FORMAT_VERSION: u32 = 3;

/// Joypad buttons in on-disk letter order, most significant bit first.
pub const BUTTON_LETTERS: &[u8; 8] = b"RLDUTSBA";

/// Device plugged into a controller port.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PortDevice {
    None,
    #[default]
    Gamepad,
}

impl PortDevice {
    /// Numeric code used in the movie header.
    pub fn code(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Gamepad => 1,
        }
    }

    /// Decode a header code. Unknown devices are treated as gamepads.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::None,
            _ => Self::Gamepad,
        }
    }
}

/// Controller configuration of a movie.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputType {
    #[default]
    TwoPlayers,
    FourScore,
}

impl InputType {
    /// Number of joypads recorded per frame.
    pub fn joypads(self) -> usize {
        match self {
            Self::TwoPlayers => 2,
            Self::FourScore => 4,
        }
    }
}

/// One frame of input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Record {
    /// Command bits (reset, power, disk insert, ...).
    pub commands: u8,
    /// Button state per joypad, `BUTTON_LETTERS` order.
    pub joypads: [u8; 4],
}

impl Record {
    pub fn new(commands: u8, joypads: [u8; 4]) -> Self {
        Self { commands, joypads }
    }
}

/// Text shown over the game from a given frame on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subtitle {
    pub frame: u32,
    pub text: String,
}

/// Recorded movie: header plus one [`Record`] per frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Movie {
    pub version: u32,
    pub emu_version: u32,
    pub rerecord_count: u32,
    pub pal: bool,
    pub rom_filename: String,
    pub rom_checksum: String,
    pub guid: String,
    pub fourscore: bool,
    pub microphone: bool,
    pub ports: [PortDevice; 2],
    pub fds: bool,
    pub comments: Vec<String>,
    pub subtitles: Vec<Subtitle>,
    /// Record count announced by the header. Refreshed before every write.
    pub load_frame_count: usize,
    pub records: Vec<Record>,
}

impl Default for Movie {
    fn default() -> Self {
        Self {
            version: MOVIE_FORMAT_VERSION,
            emu_version: crate::APP_VERSION_NUMERIC,
            rerecord_count: 0,
            pal: false,
            rom_filename: String::new(),
            rom_checksum: String::new(),
            guid: String::new(),
            fourscore: false,
            microphone: false,
            ports: [PortDevice::Gamepad; 2],
            fds: false,
            comments: Vec::new(),
            subtitles: Vec::new(),
            load_frame_count: 0,
            records: Vec::new(),
        }
    }
}

impl Movie {
    /// Number of frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the movie has no frames.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Controller configuration as described by the header.
    pub fn input_type(&self) -> InputType {
        if self.fourscore {
            InputType::FourScore
        } else {
            InputType::TwoPlayers
        }
    }

    /// Apply a controller configuration to header and records.
    pub fn set_input_type(&mut self, input_type: InputType) {
        self.fourscore = input_type == InputType::FourScore;
        self.ports = [PortDevice::Gamepad; 2];
        let used = input_type.joypads();
        for record in &mut self.records {
            record.joypads[used..].fill(0);
        }
    }

    /// Re-apply the current configuration so ports, fourscore flag and record
    /// contents agree with each other.
    pub fn normalize_input_type(&mut self) {
        self.set_input_type(self.input_type());
    }
}
