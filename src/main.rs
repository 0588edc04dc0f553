fn main() {
    ycsb_bench::cmdline();
}
