mod csa2;
mod hash;
mod random;
mod scrambling;
mod vectors;
