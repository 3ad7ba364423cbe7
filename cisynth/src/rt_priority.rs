//! Best-effort real-time priority bump for the DSP thread: `SCHED_RR` at
//! priority 50 on Linux, per spec.md §4.J. Failing to elevate priority is
//! non-fatal — the engine still runs correctly under the default
//! scheduler, just with weaker latency guarantees.

#[cfg(target_os = "linux")]
pub fn bump_to_sched_rr() {
    use libc::{pthread_self, pthread_setschedparam, sched_param, SCHED_RR};

    let param = sched_param { sched_priority: 50 };
    let thread = unsafe { pthread_self() };
    let result = unsafe { pthread_setschedparam(thread, SCHED_RR, &param) };
    if result != 0 {
        eprintln!("dsp: failed to elevate to SCHED_RR priority 50 (errno {result}), continuing at default priority");
    }
}

#[cfg(not(target_os = "linux"))]
pub fn bump_to_sched_rr() {}
