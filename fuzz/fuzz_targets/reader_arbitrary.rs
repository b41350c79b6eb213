#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Discard arbitrary byte streams through the reader, both as a
    // pre-loaded blob and as a chunked stream.  Errors are fine; panics
    // and hangs are not.

    let mut r = btf::Reader::from_slice(data);
    r.discard();
    let _ = r.finish();

    struct Chunks<'a>(&'a [u8], usize);
    impl btf::Source for Chunks<'_> {
        fn fill(&mut self, buf: &mut [u8]) -> btf::Result<usize> {
            if self.1 >= self.0.len() {
                return Err(btf::Error::Eof);
            }
            let n = 7usize.min(buf.len()).min(self.0.len() - self.1);
            buf[..n].copy_from_slice(&self.0[self.1..self.1 + n]);
            self.1 += n;
            Ok(n)
        }
    }
    let mut r = btf::Reader::with_source(64, Chunks(data, 0));
    r.discard();
    let _ = r.finish();
});
