//! RC4 stream cipher used by Word 97 document encryption.
//!
//! RC4 has known cryptographic weaknesses; it is here only to read documents
//! written by Word 97-2003 with the default "Office 97/2000 compatible" setting.

/// RC4 cipher state: the 256-entry permutation and the two indices.
pub struct Rc4 {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Schedule a new keystream from `key`.
    pub fn new<const N: usize>(key: &[u8; N]) -> Self {
        const { assert!(N > 0 && N <= 256, "RC4 keys are 1 to 256 bytes") };

        let mut s = [0u8; 256];
        for (i, slot) in s.iter_mut().enumerate() {
            *slot = i as u8;
        }

        // Key-scheduling algorithm (KSA)
        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(s[i]).wrapping_add(key[i % N]);
            s.swap(i, j as usize);
        }

        Self { s, i: 0, j: 0 }
    }

    /// Pseudo-random generation algorithm (PRGA)
    #[inline]
    fn next_keystream_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.s[self.i as usize]);
        self.s.swap(self.i as usize, self.j as usize);
        let k = self.s[self.i as usize].wrapping_add(self.s[self.j as usize]);
        self.s[k as usize]
    }

    /// XOR the keystream into `data` in place. Encryption and decryption are the same.
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        for byte in data {
            *byte ^= self.next_keystream_byte();
        }
    }
}
