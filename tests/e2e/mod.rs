// End-to-end tests for kokoro-speak
//
// Services and controllers run against a scriptable in-process engine
// (helpers::engine_mocks) so chunk ordering, concurrency and stream control can
// be asserted byte for byte. The HTTP engine is exercised against an httpmock
// server. Every test writes into its own temp directory, so tests run in
// parallel.

mod test_controllers;
mod test_kokoro_engine;
