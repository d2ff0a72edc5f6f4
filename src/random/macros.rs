/// Declares a named random stream, e.g. `define_rng!(SpreadRng)`.
///
/// The generated unit struct is passed to the `ContextRandomExt` sampling calls. Each stream is
/// a `SmallRng` seeded from the run's base seed offset by a hash of the stream's name, so a
/// spread draw never shifts the symptom draws that follow it. Declaring the same name twice in
/// one binary fails to link.
#[macro_export]
macro_rules! define_rng {
    ($stream:ident) => {
        #[derive(Copy, Clone)]
        struct $stream;

        impl $crate::random::RngId for $stream {
            type RngType = $crate::rand::rngs::SmallRng;

            fn get_name() -> &'static str {
                stringify!($stream)
            }
        }

        $crate::paste::paste! {
            #[doc(hidden)]
            #[no_mangle]
            #[allow(non_upper_case_globals)]
            pub static [<outbreak_rng_stream_ $stream>]: () = ();
        }
    };
}
