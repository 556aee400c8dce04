pub mod test_helpers {
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::rc::Rc;

    use image::{ImageFormat, Rgba, RgbaImage};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::clipboard::{ClipboardError, ClipboardSink};
    use crate::event_source::{Event, KeyCode, SimulatedEventSource};
    use crate::export::{
        DownloadSink, ExportError, FontRole, ImageDataUrl, Surface, SurfaceFactory, TextStyle,
    };

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press(mut self, code: KeyCode) -> Self {
            self.events.push(SimulatedEventSource::key(code));
            self
        }

        /// Press 'c'
        pub fn copy(self) -> Self {
            self.press_char('c')
        }

        /// Press 's'
        pub fn save_image(self) -> Self {
            self.press_char('s')
        }

        /// Press 'j' n times
        pub fn scroll_down(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('j'));
            }
            self
        }

        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        pub fn events(&self) -> &[Event] {
            &self.events
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }

    /// Clipboard that remembers what was written. Clones share the record.
    #[derive(Clone, Default)]
    pub struct MemoryClipboard {
        writes: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl MemoryClipboard {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn writes(&self) -> Vec<String> {
            self.writes.borrow().clone()
        }
    }

    impl ClipboardSink for MemoryClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::Unavailable("no clipboard in tests".to_string()));
            }
            self.writes.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum SurfaceOp {
        Rect {
            x: u32,
            y: u32,
            width: u32,
            height: u32,
            color: Rgba<u8>,
        },
        Text {
            text: String,
            x: u32,
            baseline: u32,
            role: FontRole,
            size: f32,
            color: Rgba<u8>,
        },
        Encode,
    }

    /// Surface that records drawing calls and encodes a blank PNG.
    pub struct RecordingSurface {
        width: u32,
        height: u32,
        ops: Rc<RefCell<Vec<SurfaceOp>>>,
    }

    impl RecordingSurface {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                ops: Rc::default(),
            }
        }

        pub fn ops(&self) -> Vec<SurfaceOp> {
            self.ops.borrow().clone()
        }
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
            self.ops.borrow_mut().push(SurfaceOp::Rect {
                x,
                y,
                width,
                height,
                color,
            });
        }

        fn fill_text(
            &mut self,
            text: &str,
            x: u32,
            baseline: u32,
            style: TextStyle,
            color: Rgba<u8>,
        ) -> Result<(), ExportError> {
            self.ops.borrow_mut().push(SurfaceOp::Text {
                text: text.to_string(),
                x,
                baseline,
                role: style.role,
                size: style.size,
                color,
            });
            Ok(())
        }

        fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
            self.ops.borrow_mut().push(SurfaceOp::Encode);
            let mut bytes = Vec::new();
            RgbaImage::new(1, 1).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
            Ok(bytes)
        }
    }

    /// Hands out recording surfaces and remembers the requested sizes.
    #[derive(Clone, Default)]
    pub struct RecordingSurfaceFactory {
        sizes: Rc<RefCell<Vec<(u32, u32)>>>,
        fail: bool,
    }

    impl RecordingSurfaceFactory {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every surface request fails as if no fonts were installed.
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn sizes(&self) -> Vec<(u32, u32)> {
            self.sizes.borrow().clone()
        }
    }

    impl SurfaceFactory for RecordingSurfaceFactory {
        fn create(&mut self, width: u32, height: u32) -> Result<Box<dyn Surface>, ExportError> {
            if self.fail {
                return Err(ExportError::FontUnavailable("monospace"));
            }
            self.sizes.borrow_mut().push((width, height));
            Ok(Box::new(RecordingSurface::new(width, height)))
        }
    }

    /// Download sink keeping decoded images in memory.
    #[derive(Clone, Default)]
    pub struct MemorySink {
        deliveries: Rc<RefCell<Vec<(String, Vec<u8>)>>>,
    }

    impl MemorySink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn deliveries(&self) -> Vec<(String, Vec<u8>)> {
            self.deliveries.borrow().clone()
        }
    }

    impl DownloadSink for MemorySink {
        fn deliver(&mut self, filename: &str, href: &ImageDataUrl) -> Result<PathBuf, ExportError> {
            let bytes = href.decode()?;
            self.deliveries
                .borrow_mut()
                .push((filename.to_string(), bytes));
            Ok(PathBuf::from(filename))
        }
    }
}
