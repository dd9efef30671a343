//! Fake collaborators shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tasproj::movie::Subtitle;
use tasproj::prelude::*;

/// Module whose full save always fails.
#[derive(Debug, Default)]
pub struct BrokenSave;

impl ModuleCodec for BrokenSave {
    fn save(&self, out: &mut dyn Write, include: bool) -> Result<()> {
        if include {
            out.write_all(b"half")?;
            return Err(Error::other("disk full"));
        }
        Ok(())
    }

    fn load(&mut self, _block: &[u8]) -> Result<()> {
        Ok(())
    }

    fn reset(&mut self) {}
}

/// Module storing a list of frame numbers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameList {
    pub frames: Vec<u32>,
}

impl FrameList {
    pub fn shared(frames: &[u32]) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self { frames: frames.to_vec() }))
    }
}

impl ModuleCodec for FrameList {
    fn save(&self, out: &mut dyn Write, include: bool) -> Result<()> {
        if !include {
            return Ok(());
        }
        out.write_u32::<LittleEndian>(self.frames.len() as u32)?;
        for &frame in &self.frames {
            out.write_u32::<LittleEndian>(frame)?;
        }
        Ok(())
    }

    fn load(&mut self, mut block: &[u8]) -> Result<()> {
        self.reset();
        if block.is_empty() {
            return Ok(());
        }
        let count = block.read_u32::<LittleEndian>()?;
        for _ in 0..count {
            self.frames.push(block.read_u32::<LittleEndian>()?);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.frames.clear();
    }
}

/// Notifier that records every hook call.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub dirty_events: Vec<bool>,
    pub saves: usize,
    pub subtitles: Vec<Subtitle>,
}

impl RecordingNotifier {
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn marked(&self) -> usize {
        self.dirty_events.iter().filter(|&&d| d).count()
    }
}

impl ProjectNotifier for RecordingNotifier {
    fn dirty_state_changed(&mut self, changed: bool) {
        self.dirty_events.push(changed);
    }

    fn save_progress(&mut self) {
        self.saves += 1;
    }

    fn subtitles_loaded(&mut self, subtitles: &[Subtitle]) {
        self.subtitles = subtitles.to_vec();
    }
}

/// Session component counting its resets.
#[derive(Debug, Default)]
pub struct ResetCounter {
    pub resets: usize,
}

impl SessionReset for ResetCounter {
    fn reset(&mut self) {
        self.resets += 1;
    }
}

/// Prompt that counts calls and saves to `target` when set.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    pub calls: usize,
    pub target: Option<PathBuf>,
}

impl AutosavePrompt for ScriptedPrompt {
    fn save_as(&mut self, project: &mut Project) -> bool {
        self.calls += 1;
        match &self.target {
            Some(path) => project.save_as(path).is_ok(),
            None => false,
        }
    }
}

/// A movie with a bit of everything.
pub fn sample_movie() -> Movie {
    Movie {
        rerecord_count: 1234,
        rom_filename: "Test Game".into(),
        rom_checksum: "base64:AAAA".into(),
        guid: "452DE2C3-EF43-2FA9-77AC-0677FC51543B".into(),
        comments: vec!["author tester".into()],
        subtitles: vec![Subtitle { frame: 60, text: "start".into() }],
        records: (0..300u32).map(|i| Record::new((i % 3) as u8, [i as u8, (i >> 1) as u8, 0, 0])).collect(),
        ..Default::default()
    }
}
