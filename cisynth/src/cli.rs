//! Hand-rolled CLI flag parsing over `std::env::args()`. The workspace
//! never depends on `clap`; this mirrors the plain argument scanning used
//! by the teacher's example binaries.

pub struct Cli {
    pub cli_mode: bool,
    pub sfml_window: bool,
    pub no_dmx: bool,
    pub dmx_port: String,
    pub silent_dmx: bool,
    pub list_audio_devices: bool,
    pub audio_device: Option<usize>,
}

const DEFAULT_DMX_PORT: &str = "/dev/ttyUSB0";

impl Default for Cli {
    fn default() -> Self {
        Self {
            cli_mode: false,
            sfml_window: false,
            no_dmx: false,
            dmx_port: DEFAULT_DMX_PORT.to_string(),
            silent_dmx: false,
            list_audio_devices: false,
            audio_device: None,
        }
    }
}

impl Cli {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut cli = Cli::default();

        for arg in args {
            if arg == "--cli" {
                cli.cli_mode = true;
            } else if arg == "--sfml-window" {
                cli.sfml_window = true;
            } else if arg == "--no-dmx" {
                cli.no_dmx = true;
            } else if let Some(path) = arg.strip_prefix("--dmx-port=") {
                cli.dmx_port = path.to_string();
            } else if arg == "--silent-dmx" {
                cli.silent_dmx = true;
            } else if arg == "--list-audio-devices" {
                cli.list_audio_devices = true;
            } else if let Some(index) = arg.strip_prefix("--audio-device=") {
                cli.audio_device = index.parse().ok();
            }
        }

        cli
    }
}
