use log::{info, warn};

use crate::config::{Config, IndexQuirk};
use crate::constants::{FLAG_REGISTER, FONT_ADDR, GLYPH_HEIGHT};
use crate::decoder::Decoded;
use crate::draw::DrawRequest;
use crate::error::{Error, Result};
use crate::frontend::Frontend;
use crate::instruction::Mnemonic;
use crate::keywait::KeyPromise;
use crate::state::State;

/// What the engine should do after an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Next,
    Halt(Halt),
}

/// Why the engine stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// ASSERT (F999) with the exit code taken from I
    Exit(u16),
    /// A jump to its own address; nothing else can ever run
    SelfJump(u16),
    /// The host stopped asking for more instructions
    External,
}

/// Everything an instruction may touch. `state.pc` already points past `op`.
pub struct Context<'a> {
    pub state: &'a mut State,
    pub frontend: &'a dyn Frontend,
    pub config: &'a Config,
    pub op: Decoded,
    /// Where `op` was fetched from
    pub address: u16,
}

impl Context<'_> {
    fn vx(&self) -> u8 {
        self.state.v[self.op.x()]
    }

    fn vy(&self) -> u8 {
        self.state.v[self.op.y()]
    }

    fn set_vx(&mut self, value: u8) {
        self.state.v[self.op.x()] = value;
    }

    fn skip_if(&mut self, condition: bool) -> Result<Flow> {
        if condition {
            self.state.pc = self.state.pc.wrapping_add(2);
        }
        Ok(Flow::Next)
    }

    /// Fault for an access starting at `address`; names the first byte past the end
    fn out_of_bounds(&self, address: usize) -> Error {
        Error::OutOfBounds {
            address: address.max(self.state.memory.len()),
            pc: self.address,
        }
    }

    fn advance_index(&mut self, copied: u16) {
        let x = self.op.x() as u16;
        self.state.i = match self.config.index_quirk {
            IndexQuirk::AddX => self.state.i.wrapping_add(x),
            IndexQuirk::AddXPlusOne => self.state.i.wrapping_add(copied),
            IndexQuirk::Unchanged => self.state.i,
        };
    }
}

pub type Operation = fn(&mut Context<'_>) -> Result<Flow>;

/// Selects the Operation implementing a Mnemonic
pub fn from_mnemonic(mnemonic: Mnemonic) -> Operation {
    match mnemonic {
        Mnemonic::Sys => sys,
        Mnemonic::Cls => cls,
        Mnemonic::Ret => ret,
        Mnemonic::Jp => jp,
        Mnemonic::Call => call,
        Mnemonic::Sevb => sevb,
        Mnemonic::Sneb => sneb,
        Mnemonic::Sevv => sevv,
        Mnemonic::Ldb => ldb,
        Mnemonic::Addb => addb,
        Mnemonic::Ldv => ldv,
        Mnemonic::Or => or,
        Mnemonic::And => and,
        Mnemonic::Xor => xor,
        Mnemonic::Addv => addv,
        Mnemonic::Sub => sub,
        Mnemonic::Shr => shr,
        Mnemonic::Subn => subn,
        Mnemonic::Shl => shl,
        Mnemonic::Snev => snev,
        Mnemonic::Ld => ld,
        Mnemonic::Jpv => jpv,
        Mnemonic::Rnd => rnd,
        Mnemonic::Drw => drw,
        Mnemonic::Skp => skp,
        Mnemonic::Sknp => sknp,
        Mnemonic::Ldvd => ldvd,
        Mnemonic::Ldkp => ldkp,
        Mnemonic::Lddv => lddv,
        Mnemonic::Ldds => ldds,
        Mnemonic::Addi => addi,
        Mnemonic::Lds => lds,
        Mnemonic::Ldbc => ldbc,
        Mnemonic::Ldmw => ldmw,
        Mnemonic::Ldmr => ldmr,
        Mnemonic::Assert => assert,
    }
}

/// machine code routine at addr
pub fn sys(ctx: &mut Context<'_>) -> Result<Flow> {
    Err(Error::Unsupported {
        opcode: ctx.op.opcode,
        pc: ctx.address,
    })
}

/// clear
pub fn cls(ctx: &mut Context<'_>) -> Result<Flow> {
    ctx.frontend.clear_screen();
    Ok(Flow::Next)
}

/// PC = STACK.pop()
pub fn ret(ctx: &mut Context<'_>) -> Result<Flow> {
    ctx.state.pc = ctx.state.pop().ok_or(Error::StackUnderflow {
        opcode: ctx.op.opcode,
        pc: ctx.address,
    })?;
    Ok(Flow::Next)
}

fn jump_to(ctx: &mut Context<'_>, target: u16) -> Result<Flow> {
    if target == ctx.address {
        warn!("infinite loop detected at {:#05X}, halting", target);
        return Ok(Flow::Halt(Halt::SelfJump(target)));
    }
    ctx.state.pc = target;
    Ok(Flow::Next)
}

/// PC = addr
pub fn jp(ctx: &mut Context<'_>) -> Result<Flow> {
    let target = ctx.op.nnn();
    jump_to(ctx, target)
}

/// STACK.push(PC); PC = addr
pub fn call(ctx: &mut Context<'_>) -> Result<Flow> {
    let return_address = ctx.state.pc;
    ctx.state.push(return_address).ok_or(Error::StackOverflow {
        opcode: ctx.op.opcode,
        pc: ctx.address,
    })?;
    ctx.state.pc = ctx.op.nnn();
    Ok(Flow::Next)
}

/// if Vx == kk then pc += 2
pub fn sevb(ctx: &mut Context<'_>) -> Result<Flow> {
    let condition = ctx.vx() == ctx.op.kk();
    ctx.skip_if(condition)
}

/// if Vx != kk then pc += 2
pub fn sneb(ctx: &mut Context<'_>) -> Result<Flow> {
    let condition = ctx.vx() != ctx.op.kk();
    ctx.skip_if(condition)
}

/// if Vx == Vy then pc += 2
pub fn sevv(ctx: &mut Context<'_>) -> Result<Flow> {
    let condition = ctx.vx() == ctx.vy();
    ctx.skip_if(condition)
}

/// Vx = kk
pub fn ldb(ctx: &mut Context<'_>) -> Result<Flow> {
    let kk = ctx.op.kk();
    ctx.set_vx(kk);
    Ok(Flow::Next)
}

/// Vx += kk
/// Add kk to Vx; allow for overflow but implicitly drop it
pub fn addb(ctx: &mut Context<'_>) -> Result<Flow> {
    let res = ctx.vx().wrapping_add(ctx.op.kk());
    ctx.set_vx(res);
    Ok(Flow::Next)
}

/// Vx = Vy
pub fn ldv(ctx: &mut Context<'_>) -> Result<Flow> {
    let vy = ctx.vy();
    ctx.set_vx(vy);
    Ok(Flow::Next)
}

/// Vx |= Vy
pub fn or(ctx: &mut Context<'_>) -> Result<Flow> {
    let res = ctx.vx() | ctx.vy();
    ctx.set_vx(res);
    Ok(Flow::Next)
}

/// Vx &= Vy
pub fn and(ctx: &mut Context<'_>) -> Result<Flow> {
    let res = ctx.vx() & ctx.vy();
    ctx.set_vx(res);
    Ok(Flow::Next)
}

/// Vx ^= Vy
pub fn xor(ctx: &mut Context<'_>) -> Result<Flow> {
    let res = ctx.vx() ^ ctx.vy();
    ctx.set_vx(res);
    Ok(Flow::Next)
}

/// Vx += Vy; VF = carry
pub fn addv(ctx: &mut Context<'_>) -> Result<Flow> {
    let sum = u16::from(ctx.vx()) + u16::from(ctx.vy());
    ctx.set_vx((sum & 0x00FF) as u8);
    ctx.state.set_flag(sum > 0xFF);
    Ok(Flow::Next)
}

/// Vx -= Vy; VF = !borrow
pub fn sub(ctx: &mut Context<'_>) -> Result<Flow> {
    let (vx, vy) = (ctx.vx(), ctx.vy());
    ctx.set_vx(vx.wrapping_sub(vy));
    ctx.state.set_flag(vx >= vy);
    Ok(Flow::Next)
}

/// Vx >>= 1; VF = the bit shifted out
pub fn shr(ctx: &mut Context<'_>) -> Result<Flow> {
    let vx = ctx.vx();
    ctx.state.v[FLAG_REGISTER] = vx & 0x1;
    ctx.set_vx(vx >> 1);
    Ok(Flow::Next)
}

/// Vx = Vy - Vx; VF = !borrow
pub fn subn(ctx: &mut Context<'_>) -> Result<Flow> {
    let (vx, vy) = (ctx.vx(), ctx.vy());
    ctx.set_vx(vy.wrapping_sub(vx));
    ctx.state.set_flag(vy >= vx);
    Ok(Flow::Next)
}

/// Vx <<= 1; VF = the bit shifted out
pub fn shl(ctx: &mut Context<'_>) -> Result<Flow> {
    let vx = ctx.vx();
    ctx.state.v[FLAG_REGISTER] = (vx >> 7) & 0x1;
    ctx.set_vx(vx << 1);
    Ok(Flow::Next)
}

/// if Vx != Vy then pc += 2
pub fn snev(ctx: &mut Context<'_>) -> Result<Flow> {
    let condition = ctx.vx() != ctx.vy();
    ctx.skip_if(condition)
}

/// I = addr
pub fn ld(ctx: &mut Context<'_>) -> Result<Flow> {
    ctx.state.i = ctx.op.nnn();
    Ok(Flow::Next)
}

/// PC = V0 + addr
pub fn jpv(ctx: &mut Context<'_>) -> Result<Flow> {
    let target = ctx.op.nnn() + u16::from(ctx.state.v[0x0]);
    jump_to(ctx, target)
}

/// Vx = rand_byte & kk
pub fn rnd(ctx: &mut Context<'_>) -> Result<Flow> {
    let res = ctx.state.random_byte() & ctx.op.kk();
    ctx.set_vx(res);
    Ok(Flow::Next)
}

/// draw_sprite(x=Vx y=Vy size=n)
/// Hands the sprite at mem[I..I+n] to the frontend, which XORs it onto the display.
/// Sets VF if any pixels were erased
pub fn drw(ctx: &mut Context<'_>) -> Result<Flow> {
    let start = ctx.state.i as usize;
    let rows = ctx
        .state
        .bytes(start, ctx.op.n() as usize)
        .ok_or_else(|| ctx.out_of_bounds(start))?;
    let request = DrawRequest::from_sprite(ctx.vx() as usize, ctx.vy() as usize, rows);
    let collided = ctx.frontend.post_draw_request(&request);
    ctx.state.set_flag(collided);
    Ok(Flow::Next)
}

/// if Vx.pressed then pc += 2
pub fn skp(ctx: &mut Context<'_>) -> Result<Flow> {
    let condition = ctx.frontend.is_key_pressed(ctx.vx() & 0xF);
    ctx.skip_if(condition)
}

/// if !Vx.pressed then pc += 2
pub fn sknp(ctx: &mut Context<'_>) -> Result<Flow> {
    let condition = !ctx.frontend.is_key_pressed(ctx.vx() & 0xF);
    ctx.skip_if(condition)
}

/// Vx = DT
pub fn ldvd(ctx: &mut Context<'_>) -> Result<Flow> {
    let delay = ctx.state.delay_timer;
    ctx.set_vx(delay);
    Ok(Flow::Next)
}

/// await keypress for Vx
/// Blocks the engine until the host fulfils the promise
pub fn ldkp(ctx: &mut Context<'_>) -> Result<Flow> {
    let promise = KeyPromise::new();
    info!("waiting for a key press at {:#05X}", ctx.address);
    ctx.frontend.post_key_pressed_future(promise.clone());
    let key = promise.wait();
    info!("resuming with key {:X}", key);
    ctx.set_vx(key);
    Ok(Flow::Next)
}

/// DT = Vx
pub fn lddv(ctx: &mut Context<'_>) -> Result<Flow> {
    ctx.state.delay_timer = ctx.vx();
    Ok(Flow::Next)
}

/// ST = Vx
pub fn ldds(ctx: &mut Context<'_>) -> Result<Flow> {
    ctx.state.sound_timer = ctx.vx();
    Ok(Flow::Next)
}

/// I += Vx
pub fn addi(ctx: &mut Context<'_>) -> Result<Flow> {
    ctx.state.i = ctx.state.i.wrapping_add(u16::from(ctx.vx())) & 0x0FFF;
    Ok(Flow::Next)
}

/// I = address of the glyph for the digit in Vx
pub fn lds(ctx: &mut Context<'_>) -> Result<Flow> {
    ctx.state.i = FONT_ADDR + u16::from(ctx.vx() & 0xF) * GLYPH_HEIGHT;
    Ok(Flow::Next)
}

/// mem[I..I+3] = bcd(Vx)
pub fn ldbc(ctx: &mut Context<'_>) -> Result<Flow> {
    let vx = ctx.vx();
    let bcd = [vx / 100, vx / 10 % 10, vx % 10];
    let start = ctx.state.i as usize;
    match ctx.state.bytes_mut(start, bcd.len()) {
        Some(digits) => digits.copy_from_slice(&bcd),
        None => return Err(ctx.out_of_bounds(start)),
    }
    Ok(Flow::Next)
}

/// mem[I..=I+x] = V0..=Vx
pub fn ldmw(ctx: &mut Context<'_>) -> Result<Flow> {
    let count = ctx.op.x() + 1;
    let start = ctx.state.i as usize;
    let registers = ctx.state.v;
    match ctx.state.bytes_mut(start, count) {
        Some(memory) => memory.copy_from_slice(&registers[..count]),
        None => return Err(ctx.out_of_bounds(start)),
    }
    ctx.advance_index(count as u16);
    Ok(Flow::Next)
}

/// V0..=Vx = mem[I..=I+x]
pub fn ldmr(ctx: &mut Context<'_>) -> Result<Flow> {
    let count = ctx.op.x() + 1;
    let start = ctx.state.i as usize;
    match ctx.state.bytes(start, count) {
        Some(memory) => {
            let memory = memory.to_vec();
            ctx.state.v[..count].copy_from_slice(&memory);
        }
        None => return Err(ctx.out_of_bounds(start)),
    }
    ctx.advance_index(count as u16);
    Ok(Flow::Next)
}

/// exit(I)
pub fn assert(ctx: &mut Context<'_>) -> Result<Flow> {
    Ok(Flow::Halt(Halt::Exit(ctx.state.i)))
}
