//! Default logging setup for the ATPG toolkit
//!
//! Every record is prefixed by the elapsed run time and the current and peak resident memory of
//! the process, so that long generation runs can be followed from the log alone.
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(missing_docs)]

use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Resident memory of the running process.
#[derive(Clone, Copy, Debug)]
pub struct MemoryUsage {
    /// Currently resident memory.
    pub current: MemoryAmount,
    /// Peak resident memory since process start.
    pub peak: MemoryAmount,
}

impl fmt::Display for MemoryUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "current {} peak {}", self.current, self.peak)
    }
}

/// An amount of memory in bytes, displayed with a binary unit suffix.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemoryAmount(pub usize);

impl fmt::Debug for MemoryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for MemoryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 1000 {
            return write!(f, "{:5}B", self.0);
        }
        let mut scaled = self.0 as f64 / 1024.0;
        for unit in ['K', 'M'] {
            if scaled < 1000.0 {
                return write!(f, "{scaled:5.1}{unit}");
            }
            scaled /= 1024.0;
        }
        write!(f, "{scaled:5.1}G")
    }
}

#[cfg(target_os = "linux")]
struct StatmReader {
    file: Option<std::fs::File>,
    buf: Vec<u8>,
    pagesize: usize,
}

#[cfg(target_os = "linux")]
thread_local! {
    static STATM: std::cell::RefCell<Option<StatmReader>> =
        const { std::cell::RefCell::new(None) };
}

#[cfg(target_os = "linux")]
fn current_resident() -> usize {
    use std::io::{Read, Seek};

    STATM.with_borrow_mut(|statm| {
        let statm = statm.get_or_insert_with(|| StatmReader {
            file: std::fs::File::open("/proc/self/statm").ok(),
            buf: Default::default(),
            // SAFETY: standard way to obtain page size
            pagesize: unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize },
        });
        let Some(file) = statm.file.as_mut() else { return 0 };
        statm.buf.clear();
        if file.seek(std::io::SeekFrom::Start(0)).is_err()
            || file.read_to_end(&mut statm.buf).is_err()
        {
            return 0;
        }

        let rss_pages = std::str::from_utf8(&statm.buf)
            .ok()
            .and_then(|text| text.split_ascii_whitespace().nth(1))
            .and_then(|pages| pages.parse::<usize>().ok())
            .unwrap_or(0);
        rss_pages * statm.pagesize
    })
}

#[cfg(not(target_os = "linux"))]
fn current_resident() -> usize {
    0
}

#[cfg(unix)]
fn peak_resident() -> usize {
    // SAFETY: rusage is plain old data so all zeros is valid
    let mut rusage: libc::rusage = unsafe { std::mem::zeroed() };
    // SAFETY: getrusage is safe to call as long as it can safely write to the passed pointer
    if unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut rusage) } < 0 {
        return 0;
    }
    // linux reports kilobytes, macos bytes
    if cfg!(target_os = "macos") {
        rusage.ru_maxrss as usize
    } else {
        rusage.ru_maxrss as usize * 1024
    }
}

#[cfg(not(unix))]
fn peak_resident() -> usize {
    0
}

/// Returns the current and peak resident memory of this process.
///
/// Both amounts are zero on platforms where they cannot be queried.
pub fn memory_usage() -> MemoryUsage {
    #[cfg(not(miri))]
    {
        MemoryUsage {
            current: MemoryAmount(current_resident()),
            peak: MemoryAmount(peak_resident()),
        }
    }
    #[cfg(miri)]
    {
        MemoryUsage {
            current: MemoryAmount(0),
            peak: MemoryAmount(0),
        }
    }
}

const fn fg(color: anstyle::AnsiColor) -> anstyle::Style {
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(color)))
}

const ELAPSED: anstyle::Style = fg(anstyle::AnsiColor::BrightBlack);
const RESIDENT: anstyle::Style = fg(anstyle::AnsiColor::Blue);
const PEAK: anstyle::Style = fg(anstyle::AnsiColor::BrightBlack);
const RISING_PEAK: anstyle::Style = fg(anstyle::AnsiColor::Red);
const MODULE: anstyle::Style = fg(anstyle::AnsiColor::Magenta);

/// Installs the logger of the `atpg` binary.
///
/// The filter comes from `ATPG_LOG` (default `info`), the color choice from `ATPG_LOG_STYLE`.
/// Each record is preceded by the elapsed time and the resident and peak memory. Whenever the
/// emitting module changes, a line naming the module is printed first.
pub fn setup() {
    let started = std::time::Instant::now();
    let highest_peak = AtomicUsize::new(memory_usage().peak.0);
    let previous_module = std::sync::Mutex::new(String::new());

    let env = env_logger::Env::new()
        .filter_or("ATPG_LOG", "info")
        .write_style("ATPG_LOG_STYLE");

    env_logger::Builder::from_env(env)
        .format(move |buf, record| {
            use std::io::Write;

            let elapsed = started.elapsed();
            let MemoryUsage { current, peak } = memory_usage();
            let rising = highest_peak.fetch_max(peak.0, Ordering::Relaxed) < peak.0;
            let peak_style = if rising { RISING_PEAK } else { PEAK };
            let prefix = format!(
                "{ELAPSED}{elapsed:>9.2?}{ELAPSED:#} {RESIDENT}{current}{RESIDENT:#} \
                 {peak_style}{peak}{peak_style:#}"
            );

            let module = record.target();
            let mut previous = previous_module
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *previous != module {
                module.clone_into(&mut *previous);
                writeln!(buf, "{prefix} {MODULE}{module}{MODULE:#}")?;
            }

            let level_style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{prefix} {level_style}{}{level_style:#} {}",
                record.level(),
                record.args()
            )
        })
        .init();
}

/// Logging setup for unit tests.
///
/// Output is captured by the test harness. The given filter applies unless `ATPG_LOG` is set.
/// Calling this more than once is harmless.
pub fn test_setup(default_filter: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::new().filter_or("ATPG_LOG", default_filter))
        .is_test(true)
        .try_init();
}
